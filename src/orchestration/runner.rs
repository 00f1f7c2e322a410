//! Sequential plan execution
//!
//! Jobs run one at a time in plan order. The first error aborts the run;
//! nothing after it is started.

use crate::config::schema::{BuildxConfig, ImageConfig};
use crate::error::MillResult;
use crate::orchestration::backend::{BuildBackend, BuildRequest};
use crate::orchestration::staging::StagingDir;
use crate::plan::{BuildJob, BuildPlan, ImageVariant};
use crate::ui::{self, BuildProgress, TaskSpinner, UiContext};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Inputs shared by every job of a run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Push images after (single-arch) or during (multi-arch) the build
    pub push: bool,
    /// Directory staged for every job
    pub context_dir: PathBuf,
    pub image: ImageConfig,
    pub buildx: BuildxConfig,
}

/// What a completed run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub built: usize,
    pub pushed: Vec<String>,
}

/// buildx builder for a variant: `<prefix>-multiarch` or
/// `<prefix>-rootless-multiarch`
pub fn builder_name(prefix: &str, variant: ImageVariant) -> String {
    match variant {
        ImageVariant::Regular => format!("{}-multiarch", prefix),
        ImageVariant::Rootless => format!("{}-rootless-multiarch", prefix),
    }
}

/// Executes a build plan against a backend
pub struct PlanRunner<'a> {
    backend: &'a dyn BuildBackend,
    settings: RunSettings,
    ui: UiContext,
    /// Builders already confirmed this run
    ready_builders: HashSet<String>,
}

impl<'a> PlanRunner<'a> {
    pub fn new(backend: &'a dyn BuildBackend, settings: RunSettings, ui: UiContext) -> Self {
        Self {
            backend,
            settings,
            ui,
            ready_builders: HashSet::new(),
        }
    }

    /// Run every regular job, then every rootless job
    pub async fn run(&mut self, plan: &BuildPlan) -> MillResult<RunSummary> {
        let mut summary = RunSummary::default();

        for (title, jobs) in [
            ("Building regular images...", &plan.regular),
            ("Building rootless images...", &plan.rootless),
        ] {
            if jobs.is_empty() {
                continue;
            }
            ui::section(&self.ui, title);
            for job in jobs {
                self.run_job(job, &mut summary).await?;
            }
        }

        Ok(summary)
    }

    /// Build the request for a job, pointing at an already staged context
    pub fn request_for(&self, job: &BuildJob, context: PathBuf) -> BuildRequest {
        let dockerfile = match job.variant {
            ImageVariant::Regular => self.settings.image.dockerfile.clone(),
            ImageVariant::Rootless => self.settings.image.rootless_dockerfile.clone(),
        };

        BuildRequest {
            context,
            dockerfile,
            build_args: vec![
                ("VERSION".to_string(), job.version.clone()),
                ("SHA256".to_string(), job.sha256.clone()),
            ],
            references: job
                .tags
                .iter()
                .map(|tag| self.settings.image.reference(tag))
                .collect(),
            variant: job.variant,
            version: job.version.clone(),
            builder: builder_name(&self.settings.buildx.builder_prefix, job.variant),
            platforms: self.settings.buildx.platforms.clone(),
        }
    }

    async fn run_job(&mut self, job: &BuildJob, summary: &mut RunSummary) -> MillResult<()> {
        info!("Building {} image {} ({} tags)", job.variant, job.version, job.tags.len());

        let staging = StagingDir::create(&self.settings.context_dir).await?;
        let request = self.request_for(job, staging.path().to_path_buf());

        if job.multiarch {
            self.ensure_builder(&request).await?;
        }

        // Single-arch images are pushed tag by tag once the build succeeded
        let push_inline = self.settings.push && job.multiarch;

        let label = format!("{} {}", job.variant, job.version);
        let progress = BuildProgress::new(&self.ui, &label);
        let result = self
            .backend
            .build_image(
                &request,
                push_inline,
                job.multiarch,
                &|line| progress.on_line(line),
            )
            .await;
        progress.finish();

        if let Err(e) = result {
            ui::step_error(&self.ui, &format!("{} failed", label));
            return Err(e);
        }
        summary.built += 1;

        if self.settings.push {
            if job.multiarch {
                summary.pushed.extend(request.references.iter().cloned());
            } else {
                for reference in &request.references {
                    self.backend.push_image(reference).await?;
                    summary.pushed.push(reference.clone());
                }
            }
        }

        let detail = if job.tags.is_empty() {
            "no tags".to_string()
        } else {
            job.tags.join(", ")
        };
        ui::step_ok(&self.ui, &format!("{} ({})", label, detail));
        debug!("Staging directory {} released", staging.path().display());
        Ok(())
    }

    async fn ensure_builder(&mut self, request: &BuildRequest) -> MillResult<()> {
        if self.ready_builders.contains(&request.builder) {
            return Ok(());
        }

        let mut spinner = TaskSpinner::new(&self.ui);
        spinner.start(&format!("Preparing builder {}...", request.builder));
        match self
            .backend
            .ensure_builder(&request.builder, &request.platforms)
            .await
        {
            Ok(()) => {
                spinner.stop(&format!("Builder {} ready", request.builder));
                self.ready_builders.insert(request.builder.clone());
                Ok(())
            }
            Err(e) => {
                spinner.stop_error(&format!("Creating builder {} failed", request.builder));
                Err(e)
            }
        }
    }
}
