use crate::report::{ResourceKind, TeardownPlan, TeardownReport};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};
use console::style;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

// Styling helpers

fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

fn cyan(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).cyan()
}

fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

fn bright(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright()
}

fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

// Banner

pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🧹 devsweep"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("DevOps Project Teardown Tool")
    );
}

// Progress tracking

pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1(project_name: &str) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());

        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap(),
        );
        pb.set_message(
            bright_yellow(format!("Phase 1/3: Listing pipelines of {project_name}")).to_string(),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self, pipeline_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Found {pipeline_count} pipelines ✓")).to_string(),
        );

        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap(),
        );
        pb.set_message(
            bright_yellow("Phase 2/3: Deleting pipeline stages and pipelines").to_string(),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { pb }
    }

    pub fn finish_phase_2_start_phase_3(self) -> Self {
        self.pb.finish_with_message(
            bright_green("Phase 2/3: Pipelines processed ✓").to_string(),
        );

        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap(),
        );
        pb.set_message(bright_yellow("Phase 3/3: Deleting shared resources").to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { pb }
    }

    pub fn finish_phase_3(self, deleted: usize, failed: usize) {
        if failed == 0 {
            self.pb.finish_with_message(
                bright_green(format!("Phase 3/3: Deleted {deleted} resources ✓")).to_string(),
            );
        } else {
            self.pb.finish_with_message(
                bright_red(format!(
                    "Phase 3/3: Deleted {deleted} resources, {failed} failures ✗"
                ))
                .to_string(),
            );
        }
    }
}

// Summary rendering

fn count_by_kind(entries: impl Iterator<Item = ResourceKind>) -> IndexMap<ResourceKind, usize> {
    let mut counts: IndexMap<ResourceKind, usize> = IndexMap::new();
    for kind in entries {
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts
}

pub fn render_summary(report: &TeardownReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{}  {}\n\n",
        bright("🧹"),
        bright(format!("Teardown summary for {}", report.project)).underlined()
    ));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Resource kind").fg(TableColor::Cyan),
            Cell::new("Deleted").fg(TableColor::Green),
        ]);

    for (kind, count) in count_by_kind(report.deleted.iter().map(|d| d.kind)) {
        table.add_row(vec![Cell::new(kind), Cell::new(count)]);
    }
    output.push_str(&format!("{table}\n"));

    if report.failures.is_empty() {
        output.push_str(&format!(
            "\n  {} {}\n",
            bright_green("✓"),
            bright_green("All resources deleted")
        ));
    } else {
        output.push_str(&format!(
            "\n{}  {}\n\n",
            bright("⚠️"),
            bright_red(format!("{} failures", report.failures.len())).underlined()
        ));
        for failure in &report.failures {
            output.push_str(&format!(
                "  {} {} {} {}\n",
                cyan("•"),
                failure.kind,
                bright(&failure.display_name),
                dim(&failure.message)
            ));
        }
        output.push_str(&format!(
            "\n  {} Already-deleted resources stay deleted; re-run to retry the rest\n",
            cyan("•")
        ));
    }

    output
}

pub fn render_plan(plan: &TeardownPlan) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{}  {}\n\n",
        bright("🧭"),
        bright(format!("Deletion plan for {}", plan.project)).underlined()
    ));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(TableColor::Cyan),
            Cell::new("Resource kind").fg(TableColor::Cyan),
            Cell::new("Name").fg(TableColor::Cyan),
        ]);

    for (index, entry) in plan.planned.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(entry.kind),
            Cell::new(&entry.display_name),
        ]);
    }
    output.push_str(&format!("{table}\n"));

    output.push_str(&format!(
        "\n  {} Nothing was deleted; run the teardown command to execute this plan\n",
        cyan("•")
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{DeletedResource, PlannedDeletion, TeardownFailure};
    use chrono::Utc;

    fn create_test_report(failures: Vec<TeardownFailure>) -> TeardownReport {
        TeardownReport {
            provider: "DevOps".to_string(),
            project: "demo-project".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            deleted: vec![
                DeletedResource {
                    kind: ResourceKind::BuildStage,
                    id: "stage-1".to_string(),
                    display_name: "Build sources".to_string(),
                },
                DeletedResource {
                    kind: ResourceKind::BuildStage,
                    id: "stage-2".to_string(),
                    display_name: "Deliver artifacts".to_string(),
                },
                DeletedResource {
                    kind: ResourceKind::BuildPipeline,
                    id: "pipe-1".to_string(),
                    display_name: "Build all".to_string(),
                },
            ],
            failures,
        }
    }

    #[test]
    fn summary_counts_deleted_resources_by_kind() {
        let report = create_test_report(vec![]);

        let rendered = render_summary(&report);

        assert!(rendered.contains("demo-project"));
        assert!(rendered.contains("build stage"));
        assert!(rendered.contains("build pipeline"));
        assert!(rendered.contains("All resources deleted"));
    }

    #[test]
    fn summary_lists_failures() {
        let report = create_test_report(vec![TeardownFailure {
            kind: ResourceKind::KnowledgeBase,
            id: "kb-1".to_string(),
            display_name: "audit-kb".to_string(),
            message: "API error (status 409): conflict".to_string(),
        }]);

        let rendered = render_summary(&report);

        assert!(rendered.contains("1 failures"));
        assert!(rendered.contains("audit-kb"));
        assert!(rendered.contains("status 409"));
    }

    #[test]
    fn plan_lists_entries_in_order() {
        let plan = TeardownPlan {
            provider: "DevOps".to_string(),
            project: "demo-project".to_string(),
            collected_at: Utc::now(),
            planned: vec![
                PlannedDeletion {
                    kind: ResourceKind::BuildStage,
                    id: "stage-1".to_string(),
                    display_name: "Deliver artifacts".to_string(),
                },
                PlannedDeletion {
                    kind: ResourceKind::BuildPipeline,
                    id: "pipe-1".to_string(),
                    display_name: "Build all".to_string(),
                },
            ],
        };

        let rendered = render_plan(&plan);

        assert!(rendered.contains("Deletion plan for demo-project"));
        let stage_pos = rendered.find("Deliver artifacts").unwrap();
        let pipe_pos = rendered.find("Build all").unwrap();
        assert!(
            stage_pos < pipe_pos,
            "Stages must be listed before their pipeline"
        );
        assert!(rendered.contains("Nothing was deleted"));
    }
}
