//! Build plan selection
//!
//! Turns the version table and the requested build mode into the ordered
//! jobs to execute. Everything here is pure; nothing touches the process
//! environment or the build tool.

use crate::buildinfo::{BuildInfo, VersionEntry};
use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// Suffix appended to every tag of a rootless image
pub const ROOTLESS_SUFFIX: &str = "-rootless";

/// Which Dockerfile an image is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageVariant {
    Regular,
    Rootless,
}

impl ImageVariant {
    pub fn is_rootless(self) -> bool {
        matches!(self, Self::Rootless)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Rootless => "rootless",
        }
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four switches that drive selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSelection {
    pub build_regular: bool,
    pub build_rootless: bool,
    pub only_stable_latest: bool,
    pub multiarch: bool,
}

impl BuildSelection {
    /// Derive the selection from the command-line mode flags.
    ///
    /// Regular images are built unless `--rootless` is given alone.
    pub fn from_mode(rootless: bool, both: bool, only_stable_latest: bool, multiarch: bool) -> Self {
        Self {
            build_regular: !rootless || both,
            build_rootless: rootless || both,
            only_stable_latest,
            multiarch,
        }
    }

    fn rootless_only(&self) -> bool {
        self.build_rootless && !self.build_regular
    }

    /// Rootless reuses the regular version set only when both variants are
    /// built without the stable-only restriction.
    fn rootless_mirrors_regular(&self) -> bool {
        self.build_regular && self.build_rootless && !self.only_stable_latest
    }
}

/// A single image to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    pub version: String,
    pub sha256: String,
    pub tags: Vec<String>,
    pub variant: ImageVariant,
    pub multiarch: bool,
}

impl BuildJob {
    fn new(version: &str, entry: &VersionEntry, variant: ImageVariant, multiarch: bool) -> Self {
        let tags = match variant {
            ImageVariant::Regular => entry.tags.clone(),
            ImageVariant::Rootless => rootless_tags(&entry.tags),
        };
        Self {
            version: version.to_string(),
            sha256: entry.sha256.clone(),
            tags,
            variant,
            multiarch,
        }
    }

    pub fn is_rootless(&self) -> bool {
        self.variant.is_rootless()
    }
}

/// Ordered jobs for one run: every regular job runs before any rootless one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    pub regular: Vec<BuildJob>,
    pub rootless: Vec<BuildJob>,
}

impl BuildPlan {
    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.rootless.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regular.len() + self.rootless.len()
    }

    /// All jobs in execution order
    pub fn jobs(&self) -> impl Iterator<Item = &BuildJob> {
        self.regular.iter().chain(self.rootless.iter())
    }
}

/// Map tags to their rootless counterparts, keeping order
pub fn rootless_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| format!("{tag}{ROOTLESS_SUFFIX}"))
        .collect()
}

/// Total order over version identifiers, ascending.
///
/// Semantic versions compare semantically and rank above anything that does
/// not parse; the rest compare as plain strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Compute the regular and rootless jobs for a run
pub fn select(info: &BuildInfo, selection: &BuildSelection) -> BuildPlan {
    let mut versions: Vec<(&str, &VersionEntry)> = info.iter().collect();
    versions.sort_by(|(a, _), (b, _)| compare_versions(b, a));

    let restrict_regular = selection.only_stable_latest || selection.rootless_only();

    let regular_versions: Vec<(&str, &VersionEntry)> = if selection.build_regular {
        versions
            .iter()
            .copied()
            .filter(|(_, entry)| !restrict_regular || entry.is_stable_marked())
            .collect()
    } else {
        Vec::new()
    };

    let rootless_versions: Vec<(&str, &VersionEntry)> = if !selection.build_rootless {
        Vec::new()
    } else if selection.rootless_mirrors_regular() {
        regular_versions.clone()
    } else {
        versions
            .iter()
            .copied()
            .filter(|(_, entry)| entry.is_stable_marked())
            .collect()
    };

    let jobs = |set: &[(&str, &VersionEntry)], variant: ImageVariant| -> Vec<BuildJob> {
        set.iter()
            .map(|(version, entry)| BuildJob::new(version, entry, variant, selection.multiarch))
            .collect()
    };

    BuildPlan {
        regular: jobs(&regular_versions, ImageVariant::Regular),
        rootless: jobs(&rootless_versions, ImageVariant::Rootless),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sha: &str, tags: &[&str]) -> VersionEntry {
        VersionEntry {
            sha256: sha.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// The two-version table used throughout the plan scenarios
    fn small_table() -> BuildInfo {
        BuildInfo::from_entries([
            ("1.1.0".to_string(), entry("abc", &["stable"])),
            ("1.0.0".to_string(), entry("def", &["1.0.0"])),
        ])
    }

    fn wide_table() -> BuildInfo {
        BuildInfo::from_entries([
            ("0.17.79".to_string(), entry("a", &["0.17", "0.17.79"])),
            ("1.1.110".to_string(), entry("b", &["stable", "1.1", "1.1.110"])),
            ("1.0.0".to_string(), entry("c", &["1.0", "1.0.0"])),
            ("2.0.9".to_string(), entry("d", &["2.0.9"])),
            ("2.0.10".to_string(), entry("e", &["latest", "2.0", "2.0.10"])),
        ])
    }

    fn versions(jobs: &[BuildJob]) -> Vec<&str> {
        jobs.iter().map(|j| j.version.as_str()).collect()
    }

    fn all_selections() -> Vec<BuildSelection> {
        let mut out = Vec::new();
        for bits in 0..16u8 {
            out.push(BuildSelection {
                build_regular: bits & 1 != 0,
                build_rootless: bits & 2 != 0,
                only_stable_latest: bits & 4 != 0,
                multiarch: bits & 8 != 0,
            });
        }
        out
    }

    #[test]
    fn mode_flags_map_to_selection() {
        let default = BuildSelection::from_mode(false, false, false, false);
        assert!(default.build_regular);
        assert!(!default.build_rootless);

        let rootless = BuildSelection::from_mode(true, false, false, false);
        assert!(!rootless.build_regular);
        assert!(rootless.build_rootless);

        let both = BuildSelection::from_mode(false, true, false, true);
        assert!(both.build_regular);
        assert!(both.build_rootless);
        assert!(both.multiarch);

        let both_and_rootless = BuildSelection::from_mode(true, true, false, false);
        assert!(both_and_rootless.build_regular);
        assert!(both_and_rootless.build_rootless);
    }

    #[test]
    fn versions_sort_semantically_descending() {
        let plan = select(&wide_table(), &BuildSelection::from_mode(false, false, false, false));
        assert_eq!(
            versions(&plan.regular),
            vec!["2.0.10", "2.0.9", "1.1.110", "1.0.0", "0.17.79"]
        );
    }

    #[test]
    fn output_is_strictly_descending_for_every_selection() {
        let table = wide_table();
        for selection in all_selections() {
            let plan = select(&table, &selection);
            for jobs in [&plan.regular, &plan.rootless] {
                for pair in jobs.windows(2) {
                    assert_eq!(
                        compare_versions(&pair[0].version, &pair[1].version),
                        Ordering::Greater,
                        "{selection:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn non_semver_identifiers_sort_below_semver() {
        assert_eq!(compare_versions("1.0.0", "experimental"), Ordering::Greater);
        assert_eq!(compare_versions("beta", "alpha"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.10", "2.0.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
    }

    #[test]
    fn rootless_only_selects_stable_marked() {
        let selection = BuildSelection {
            build_regular: false,
            build_rootless: true,
            only_stable_latest: false,
            multiarch: false,
        };
        let plan = select(&wide_table(), &selection);
        assert!(plan.regular.is_empty());
        assert_eq!(versions(&plan.rootless), vec!["2.0.10", "1.1.110"]);
    }

    #[test]
    fn regular_only_has_no_rootless_jobs() {
        for only_stable_latest in [false, true] {
            let selection = BuildSelection {
                build_regular: true,
                build_rootless: false,
                only_stable_latest,
                multiarch: false,
            };
            let plan = select(&wide_table(), &selection);
            assert!(plan.rootless.is_empty());
            assert!(!plan.regular.is_empty());
        }
    }

    #[test]
    fn only_stable_latest_restricts_every_job() {
        let table = wide_table();
        for selection in all_selections().into_iter().filter(|s| s.only_stable_latest) {
            let plan = select(&table, &selection);
            for job in plan.jobs() {
                assert!(
                    table.get(&job.version).unwrap().is_stable_marked(),
                    "{} selected under {selection:?}",
                    job.version
                );
            }
        }
    }

    #[test]
    fn both_without_restriction_mirrors_regular() {
        let plan = select(&wide_table(), &BuildSelection::from_mode(false, true, false, false));
        assert_eq!(plan.regular.len(), 5);
        assert_eq!(versions(&plan.rootless), versions(&plan.regular));
        assert!(plan.rootless.iter().all(BuildJob::is_rootless));
        assert!(!plan.regular.iter().any(BuildJob::is_rootless));
    }

    #[test]
    fn nothing_requested_yields_empty_plan() {
        let selection = BuildSelection::default();
        let plan = select(&wide_table(), &selection);
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn rootless_tags_keep_order_and_length() {
        let tags = vec!["latest".to_string(), "2.0".to_string(), "2.0.10".to_string()];
        assert_eq!(
            rootless_tags(&tags),
            vec!["latest-rootless", "2.0-rootless", "2.0.10-rootless"]
        );
        assert!(rootless_tags(&[]).is_empty());
    }

    #[test]
    fn scenario_both_only_stable_latest() {
        let plan = select(&small_table(), &BuildSelection::from_mode(false, true, true, false));

        assert_eq!(plan.regular.len(), 1);
        assert_eq!(plan.regular[0].version, "1.1.0");
        assert_eq!(plan.regular[0].tags, vec!["stable"]);
        assert_eq!(plan.regular[0].sha256, "abc");

        assert_eq!(plan.rootless.len(), 1);
        assert_eq!(plan.rootless[0].version, "1.1.0");
        assert_eq!(plan.rootless[0].tags, vec!["stable-rootless"]);
    }

    #[test]
    fn scenario_rootless_flag_alone() {
        let plan = select(&small_table(), &BuildSelection::from_mode(true, false, false, false));

        assert!(plan.regular.is_empty());
        assert_eq!(plan.rootless.len(), 1);
        assert_eq!(plan.rootless[0].version, "1.1.0");
        assert_eq!(plan.rootless[0].tags, vec!["stable-rootless"]);
    }

    #[test]
    fn rootless_with_only_stable_latest_matches_rootless_alone() {
        let table = wide_table();
        let plain = select(&table, &BuildSelection::from_mode(true, false, false, false));
        let restricted = select(&table, &BuildSelection::from_mode(true, false, true, false));
        assert_eq!(plain, restricted);
    }

    #[test]
    fn default_mode_builds_every_version() {
        let plan = select(&small_table(), &BuildSelection::from_mode(false, false, false, false));
        assert_eq!(versions(&plan.regular), vec!["1.1.0", "1.0.0"]);
        assert!(plan.rootless.is_empty());
    }

    #[test]
    fn jobs_carry_multiarch_and_hash() {
        let plan = select(&small_table(), &BuildSelection::from_mode(false, true, false, true));
        assert!(plan.jobs().all(|job| job.multiarch));
        let old = plan.rootless.iter().find(|j| j.version == "1.0.0").unwrap();
        assert_eq!(old.sha256, "def");
        assert_eq!(old.tags, vec!["1.0.0-rootless"]);
    }

    #[test]
    fn jobs_iterate_regular_first() {
        let plan = select(&small_table(), &BuildSelection::from_mode(false, true, false, false));
        let order: Vec<ImageVariant> = plan.jobs().map(|j| j.variant).collect();
        assert_eq!(
            order,
            vec![
                ImageVariant::Regular,
                ImageVariant::Regular,
                ImageVariant::Rootless,
                ImageVariant::Rootless
            ]
        );
    }
}
