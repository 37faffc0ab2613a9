//! The `likeness plan` command: a dry run of `generate`.

use clap::Args;
use likeness_core::{plan, BaseImage, Config, OutputWriter, PlannedItem};
use std::path::PathBuf;

/// Arguments for the `plan` command.
#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Base image (<influencer>_baseimage.<ext>) or a directory containing one
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output root directory (overrides general.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Plan as if resume were disabled
    #[arg(long)]
    pub no_resume: bool,
}

/// Execute the plan command. Never touches the network or needs a key.
pub fn execute(args: PlanArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(output) = &args.output {
        config.general.output_dir = output.clone();
    }
    let resume = config.generation.resume && !args.no_resume;

    let base = BaseImage::load(&args.input, &config.limits)?;
    let writer = OutputWriter::from_config(&config);
    let items = plan(&writer, &base.influencer_id, resume);

    for line in format_plan(&base.influencer_id, &items) {
        println!("{line}");
    }
    Ok(())
}

fn format_plan(influencer_id: &str, items: &[PlannedItem]) -> Vec<String> {
    let to_generate = items.iter().filter(|i| i.will_generate).count();
    let mut lines = items
        .iter()
        .map(|item| {
            let action = match (item.will_generate, item.exists) {
                (false, _) => "skip",
                (true, true) => "regenerate",
                (true, false) => "generate",
            };
            format!(
                "{:<12} {:<11} {}",
                item.key.to_string(),
                action,
                item.output_path.display()
            )
        })
        .collect::<Vec<_>>();
    lines.push(format!(
        "{influencer_id}: {to_generate} to generate, {} already done",
        items.len() - to_generate
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use likeness_core::Category;

    #[test]
    fn test_format_plan_actions() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), "png");
        writer.write("zed", Category::Neutral, 1, b"x").unwrap();

        let lines = format_plan("zed", &plan(&writer, "zed", true));
        assert_eq!(lines.len(), 16);
        assert!(lines[0].starts_with("Neutral/1    skip"));
        assert!(lines[1].starts_with("Neutral/2    generate"));
        assert_eq!(lines[15], "zed: 14 to generate, 1 already done");

        let lines = format_plan("zed", &plan(&writer, "zed", false));
        assert!(lines[0].starts_with("Neutral/1    regenerate"));
        assert_eq!(lines[15], "zed: 15 to generate, 0 already done");
    }
}
