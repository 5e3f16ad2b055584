//! Collision-free rename plans.

use std::path::{Path, PathBuf};

use snapsort_core::{NamingScheme, STAGING_PREFIX, validate_prefix};

use crate::error::EngineError;

/// One entry of a rename plan: where the file is, where it hides
/// during staging, and where it ends up.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub staging: PathBuf,
    pub target: PathBuf,
}

/// The full two-phase plan for one batch, built once per invocation.
///
/// Staging names are pairwise distinct and disjoint from every source
/// and target of the same plan, so executing all stage moves before
/// any commit move cannot collide. Target names are pairwise distinct
/// because each carries its own number.
#[derive(Debug)]
pub struct RenamePlan {
    entries: Vec<PlanEntry>,
    dir: PathBuf,
}

impl RenamePlan {
    /// Build the plan for `paths` under `scheme`, in input order.
    ///
    /// Entry `i` receives number `start_number + i`; the zero-pad
    /// width is fixed for the whole batch by the largest target
    /// number. The working directory is derived from the first path.
    /// A source that already carries the reserved staging prefix is
    /// rejected, which is what keeps the staging namespace disjoint
    /// from the sources.
    pub fn build(paths: &[PathBuf], scheme: &NamingScheme) -> Result<Self, EngineError> {
        if paths.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        validate_prefix(&scheme.prefix)
            .map_err(|reason| EngineError::InvalidPrefix { reason })?;

        let dir = paths[0]
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();
        let count = paths.len();

        let mut entries = Vec::with_capacity(count);
        for (index, source) in paths.iter().enumerate() {
            let basename = source
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            if basename.starts_with(STAGING_PREFIX) {
                return Err(EngineError::ReservedName {
                    path: source.clone(),
                });
            }

            let extension = source
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| format!(".{ext}"))
                .unwrap_or_default();

            entries.push(PlanEntry {
                source: source.clone(),
                staging: dir.join(scheme.staging_name(index, &extension)),
                target: dir.join(scheme.target_name(index, count, &extension)),
            });
        }

        Ok(Self { entries, dir })
    }

    /// Entries in plan order.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// The directory the batch operates in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan is empty (never true for a built plan).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn paths(dir: &str, names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| Path::new(dir).join(n)).collect()
    }

    #[test]
    fn test_plan_maps_input_order_to_numbers() {
        let batch = paths("/m", &["b.jpg", "a.png", "c.gif"]);
        let plan = RenamePlan::build(&batch, &NamingScheme::new("img")).unwrap();

        assert_eq!(plan.dir(), Path::new("/m"));
        let targets: Vec<_> = plan.entries().iter().map(|e| e.target.clone()).collect();
        assert_eq!(
            targets,
            paths("/m", &["img1.jpg", "img2.png", "img3.gif"])
        );
    }

    #[test]
    fn test_staging_and_target_names_unique_across_batch_shapes() {
        let scheme_variants = [
            NamingScheme::new("p"),
            NamingScheme::new("img"),
            NamingScheme::builder()
                .prefix("trip")
                .start_number(0u64)
                .build()
                .unwrap(),
            NamingScheme::builder()
                .prefix("holiday 2025")
                .start_number(995u64)
                .build()
                .unwrap(),
        ];

        for count in [1usize, 2, 9, 10, 99, 100, 250, 1000] {
            // Source names chosen to overlap the target namespace.
            let batch: Vec<PathBuf> = (0..count)
                .map(|i| {
                    let ext = ["jpg", "png", "webp"][i % 3];
                    Path::new("/m").join(format!("img{}.{ext}", count - i))
                })
                .collect();

            for scheme in &scheme_variants {
                let plan = RenamePlan::build(&batch, scheme).unwrap();
                assert_eq!(plan.len(), count);

                let stagings: Vec<_> =
                    plan.entries().iter().map(|e| e.staging.clone()).collect();
                let targets: Vec<_> =
                    plan.entries().iter().map(|e| e.target.clone()).collect();

                assert!(stagings.iter().all_unique());
                assert!(targets.iter().all_unique());
                for staging in &stagings {
                    assert!(!batch.contains(staging));
                    assert!(!targets.contains(staging));
                }
            }
        }
    }

    #[test]
    fn test_empty_batch_rejected() {
        let result = RenamePlan::build(&[], &NamingScheme::new("img"));
        assert!(matches!(result, Err(EngineError::EmptyBatch)));
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let batch = paths("/m", &["a.jpg"]);
        let scheme = NamingScheme::new("a/b");
        assert!(matches!(
            RenamePlan::build(&batch, &scheme),
            Err(EngineError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn test_reserved_source_name_rejected() {
        let batch = paths("/m", &["a.jpg", ".staged-img-0.jpg"]);
        assert!(matches!(
            RenamePlan::build(&batch, &NamingScheme::new("img")),
            Err(EngineError::ReservedName { .. })
        ));
    }

    #[test]
    fn test_extension_preserved_per_entry() {
        let batch = paths("/m", &["a.JPG", "b"]);
        let plan = RenamePlan::build(&batch, &NamingScheme::new("x")).unwrap();

        assert_eq!(plan.entries()[0].target, Path::new("/m").join("x1.JPG"));
        assert_eq!(plan.entries()[1].target, Path::new("/m").join("x2"));
    }
}
