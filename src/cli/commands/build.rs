//! Build command - plan and run the image matrix

use crate::buildinfo::BuildInfo;
use crate::cli::args::Cli;
use crate::config::Config;
use crate::credentials::RegistryCredentials;
use crate::error::{MillError, MillResult};
use crate::orchestration::{BuildBackend, DockerCli, PlanRunner, RunSettings};
use crate::plan::{self, BuildJob, BuildPlan, BuildSelection};
use crate::ui::{self, TaskSpinner, UiContext};
use tracing::debug;

/// Execute a build run
pub async fn execute(cli: &Cli, config: &Config) -> MillResult<()> {
    let ctx = UiContext::detect();

    let buildinfo_path = cli
        .buildinfo
        .clone()
        .unwrap_or_else(|| config.general.buildinfo.clone());
    let context_dir = cli
        .context
        .clone()
        .unwrap_or_else(|| config.general.context_dir.clone());

    let info = BuildInfo::load(&buildinfo_path).await?;

    let selection = BuildSelection::from_mode(
        cli.rootless,
        cli.both,
        cli.only_stable_latest,
        cli.multiarch,
    );
    debug!("Selection: {:?}", selection);
    let plan = plan::select(&info, &selection);

    ui::intro(&ctx, "imagemill");
    ui::key_value(&ctx, "repository", &config.image.repository);
    ui::key_value(&ctx, "mode", &describe_mode(&selection));
    ui::key_value(&ctx, "jobs", &plan.len().to_string());

    if cli.dry_run {
        for line in render_plan(&plan, config) {
            println!("{}", line);
        }
        ui::outro_success(&ctx, "Dry run: nothing was built");
        return Ok(());
    }

    // Configuration problems surface before anything is built
    let credentials = if cli.push_tags {
        Some(RegistryCredentials::from_env(&config.registry)?)
    } else {
        None
    };
    if !context_dir.is_dir() {
        return Err(MillError::ContextNotFound(context_dir));
    }

    if plan.is_empty() {
        ui::outro_success(&ctx, "Nothing to build");
        return Ok(());
    }

    let backend = DockerCli::new(config.general.docker_binary.clone());
    debug!("Using backend: {}", backend.backend_name());

    if let Some(ref credentials) = credentials {
        login(&ctx, &backend, credentials).await?;
    }

    let settings = RunSettings {
        push: cli.push_tags,
        context_dir,
        image: config.image.clone(),
        buildx: config.buildx.clone(),
    };
    let mut runner = PlanRunner::new(&backend, settings, ctx.clone());
    // The failing step is already reported; main prints the error
    let summary = runner.run(&plan).await?;

    let message = if cli.push_tags {
        format!(
            "Built {} images, pushed {} tags",
            summary.built,
            summary.pushed.len()
        )
    } else {
        format!("Built {} images", summary.built)
    };
    ui::outro_success(&ctx, &message);
    Ok(())
}

async fn login(
    ctx: &UiContext,
    backend: &dyn BuildBackend,
    credentials: &RegistryCredentials,
) -> MillResult<()> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Logging in to registry...");
    match backend.login(credentials).await {
        Ok(()) => {
            spinner.stop(&format!("Logged in as {}", credentials.username));
            Ok(())
        }
        Err(e) => {
            spinner.stop_error("Docker login failed");
            Err(e)
        }
    }
}

fn describe_mode(selection: &BuildSelection) -> String {
    let variants = match (selection.build_regular, selection.build_rootless) {
        (true, true) => "regular + rootless",
        (false, true) => "rootless",
        _ => "regular",
    };
    let arch = if selection.multiarch {
        "multi-arch"
    } else {
        "host arch"
    };
    if selection.only_stable_latest {
        format!("{}, {}, stable/latest only", variants, arch)
    } else {
        format!("{}, {}", variants, arch)
    }
}

/// One line per job, in execution order
fn render_plan(plan: &BuildPlan, config: &Config) -> Vec<String> {
    if plan.is_empty() {
        return vec!["(no images selected)".to_string()];
    }

    let render = |job: &BuildJob| {
        let references: Vec<String> = job
            .tags
            .iter()
            .map(|tag| config.image.reference(tag))
            .collect();
        format!(
            "{:<9} {:<10} {}",
            job.variant.name(),
            job.version,
            if references.is_empty() {
                "(no tags)".to_string()
            } else {
                references.join(" ")
            }
        )
    };

    plan.jobs().map(render).collect()
}
