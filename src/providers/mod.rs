mod devops;

pub use devops::DevOpsTeardown;
