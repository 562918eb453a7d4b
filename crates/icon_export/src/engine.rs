//! Item classification and incremental icon compositing.
//!
//! The [`IconBuildEngine`] turns the catalog into a set of derived files in the icon
//! folder plus the per-item [`ServiceMetadata`].
//!
//! # Build Algorithm
//!
//! 1. Load the previous [`BuildIndex`] from `cache.csv` in the icon folder.
//! 2. Select items: apply the test-type filter, drop groups without a category,
//!    items with neither icon nor graphic (unless they are SKINs) and, if requested,
//!    the SKIN categories.
//! 3. Classify every selected item into an [`ItemIconTask`]. Classification only asks
//!    the cache whether resources exist and what their declared hashes are, so no
//!    texture is downloaded yet. Each variant gets a content-derived filename which
//!    is registered in the new index and recorded in the service metadata.
//! 4. Every filename not already present in the previous index is put into the
//!    compositing plan. The plan is keyed by filename, so items sharing art share
//!    one entry and each derived file is produced at most once.
//! 5. The plan is rendered in parallel. A resource that cannot be fetched drops its
//!    filename from the new index and the metadata; undecodable art aborts the build.
//! 6. The delta against the previous index is reported. The new index is returned
//!    unsaved; [`build_icon_export`](crate::build_icon_export) persists it once the
//!    output is written.

use crate::data::{CategoryId, IconBuildData, TypeId, TypeInfo};
use crate::error::{Error, Result};
use crate::index::{BuildIndex, INDEX_FILE_NAME};
use crate::kind::IconKind;
use crate::recipe::Recipe;
use crate::rules::BuildRules;
use camino::{Utf8Path, Utf8PathBuf};
use icon_cache::SharedCache;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Item -> kind -> derived filename.
pub type ServiceMetadata = BTreeMap<TypeId, BTreeMap<IconKind, String>>;

/// How often progress is reported during classification.
const PROGRESS_INTERVAL: usize = 500;

/// How many skipped item ids the report keeps as examples.
const SKIPPED_EXAMPLES: usize = 10;

/// Switches that change what a build does.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Recomposite every derived file even if the previous build produced it.
    pub force_rebuild: bool,
    /// Leave out items in the SKIN categories.
    pub skip_skins: bool,
    /// Only build this one item.
    pub test_type_id: Option<TypeId>,
    /// Report progress every few hundred items.
    pub show_progress: bool,
}

/// Progress update emitted during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    /// 1-based position of the item being classified.
    pub current: usize,
    pub total: usize,
}

type ProgressCallback = Arc<dyn Fn(BuildProgress) + Send + Sync>;

/// One derived file an item wants, and the kinds it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVariant {
    pub kinds: Vec<IconKind>,
    pub filename: String,
    pub recipe: Recipe,
}

/// Classification result for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIconTask {
    pub type_id: TypeId,
    pub variants: Vec<PlannedVariant>,
    /// The item should have an icon but none of its candidate resources exist.
    pub missing_icon: bool,
}

impl ItemIconTask {
    fn new(type_id: TypeId) -> Self {
        Self {
            type_id,
            variants: Vec::new(),
            missing_icon: false,
        }
    }

    fn push(&mut self, kinds: &[IconKind], filename: String, recipe: Recipe) {
        self.variants.push(PlannedVariant {
            kinds: kinds.to_vec(),
            filename,
            recipe,
        });
    }
}

/// Wall-clock time spent in each phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    pub classify: Duration,
    pub composite: Duration,
    pub package: Duration,
}

/// Summary of one build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Items that passed selection.
    pub considered: usize,
    /// Derived files written in this run.
    pub composited: usize,
    /// Derived files carried over from the previous build.
    pub reused: usize,
    /// Derived files dropped because a source could not be fetched.
    pub failed: usize,
    /// Items left without an icon, in catalog order.
    pub skipped: Vec<TypeId>,
    pub to_add: usize,
    pub to_remove: usize,
    /// Packaging was skipped because nothing changed.
    pub output_skipped: bool,
    /// Digest produced by the checksum output.
    pub checksum: Option<String>,
    pub timings: PhaseTimings,
}

impl BuildReport {
    /// First few skipped item ids.
    pub fn skipped_examples(&self) -> &[TypeId] {
        &self.skipped[..self.skipped.len().min(SKIPPED_EXAMPLES)]
    }
}

/// Everything a build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub index: BuildIndex,
    pub metadata: ServiceMetadata,
    pub report: BuildReport,
}

/// Builds item icons into a content-addressed icon folder.
///
/// Create an engine with [`new`](Self::new), optionally replace the lookup tables
/// with [`with_rules`](Self::with_rules) and the switches with
/// [`with_options`](Self::with_options), then call [`build`](Self::build).
pub struct IconBuildEngine<'a> {
    data: &'a IconBuildData,
    cache: &'a dyn SharedCache,
    icon_dir: Utf8PathBuf,
    rules: BuildRules,
    options: BuildOptions,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> IconBuildEngine<'a> {
    pub fn new(data: &'a IconBuildData, cache: &'a dyn SharedCache, icon_dir: Utf8PathBuf) -> Self {
        Self {
            data,
            cache,
            icon_dir,
            rules: BuildRules::default(),
            options: BuildOptions::default(),
            progress_callback: None,
        }
    }

    pub fn with_rules(mut self, rules: BuildRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a progress callback, called alongside the progress log lines.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(BuildProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn icon_dir(&self) -> &Utf8Path {
        &self.icon_dir
    }

    pub fn data(&self) -> &IconBuildData {
        self.data
    }

    pub fn cache(&self) -> &dyn SharedCache {
        self.cache
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn index_path(&self) -> Utf8PathBuf {
        self.icon_dir.join(INDEX_FILE_NAME)
    }

    /// Items that take part in the build, in catalog order, with their category.
    pub fn selected_items(&self) -> Vec<(TypeId, TypeInfo, CategoryId)> {
        let mut items = Vec::new();

        for (&type_id, &info) in &self.data.types {
            if self
                .options
                .test_type_id
                .is_some_and(|test_id| test_id != type_id)
            {
                continue;
            }

            let Some(category) = self.data.category_of(info.group_id) else {
                tracing::info!("Group {} has no category, skipping type {}", info.group_id, type_id);
                continue;
            };

            if info.icon_id.is_none()
                && info.graphic_id.is_none()
                && category != self.rules.skin_category
            {
                continue;
            }

            if self.options.skip_skins && self.rules.is_skin_category(category) {
                continue;
            }

            items.push((type_id, info, category));
        }

        items
    }

    /// Decide which derived files an item needs. Performs no downloads.
    pub fn classify(&self, type_id: TypeId, info: &TypeInfo, category: CategoryId) -> ItemIconTask {
        let mut task = ItemIconTask::new(type_id);
        if self.rules.is_blueprint_like(category) {
            self.classify_blueprint(&mut task, info, category);
        } else {
            self.classify_regular(&mut task, info, category);
        }
        task
    }

    /// Declared hash of a resource, `None` if the cache does not list it.
    fn hash_of(&self, resource: &str) -> Option<String> {
        if !self.cache.has(resource) {
            return None;
        }
        self.cache.hash_of(resource).ok()
    }

    /// Tech badge resource and hash. A badge the cache does not list counts as none.
    fn tech_overlay(&self, info: &TypeInfo) -> Option<(String, String)> {
        let resource = self.rules.tech_overlay(info.meta_group_id)?;
        match self.hash_of(resource) {
            Some(hash) => Some((resource.to_string(), hash)),
            None => {
                tracing::debug!("Tech overlay {} is not in the cache", resource);
                None
            }
        }
    }

    fn classify_blueprint(&self, task: &mut ItemIconTask, info: &TypeInfo, category: CategoryId) {
        let tech = self.tech_overlay(info);
        let tech_hash = tech.as_ref().map(|(_, hash)| hash.as_str());

        if !self.rules.forces_icon(info.group_id) {
            if let Some((graphic_id, folder)) = self.data.graphic_folder(info.graphic_id) {
                let bp = BuildRules::graphic_texture(folder, graphic_id, "64_bp.png");
                if let Some(bp_hash) = self.hash_of(&bp) {
                    let filename = IconKind::Blueprint.derived_filename(&hashes(&bp_hash, tech_hash));
                    task.push(
                        &[IconKind::Icon, IconKind::Blueprint],
                        filename,
                        badge_or_copy(bp, tech.as_ref()),
                    );

                    let bpc = BuildRules::graphic_texture(folder, graphic_id, "64_bpc.png");
                    if let Some(bpc_hash) = self.hash_of(&bpc) {
                        let filename =
                            IconKind::BlueprintCopy.derived_filename(&hashes(&bpc_hash, tech_hash));
                        task.push(
                            &[IconKind::BlueprintCopy],
                            filename,
                            badge_or_copy(bpc, tech.as_ref()),
                        );
                    }
                    return;
                }
            }
        }

        let Some((icon, icon_hash)) = self
            .data
            .icon_file(info.icon_id)
            .and_then(|icon| Some((icon.to_string(), self.hash_of(icon)?)))
        else {
            task.missing_icon = true;
            return;
        };

        let art = &self.rules.art;
        let source_hashes = hashes(&icon_hash, tech_hash);
        let layered = |background: &str, overlay: &str| Recipe::Layered {
            background: background.to_string(),
            overlay: overlay.to_string(),
            icon: icon.clone(),
            tech: tech.as_ref().map(|(resource, _)| resource.clone()),
        };

        if self.rules.is_relic(category) {
            task.push(
                &[IconKind::Icon, IconKind::Relic],
                IconKind::Relic.derived_filename(&source_hashes),
                layered(&art.relic_background, &art.relic_overlay),
            );
        } else if self.rules.is_reaction(info.group_id) {
            task.push(
                &[IconKind::Icon, IconKind::Reaction, IconKind::Blueprint],
                IconKind::Reaction.derived_filename(&source_hashes),
                layered(&art.reaction_background, &art.bpo_overlay),
            );
        } else {
            task.push(
                &[IconKind::Icon, IconKind::Blueprint],
                IconKind::Blueprint.derived_filename(&source_hashes),
                layered(&art.bpo_background, &art.bpo_overlay),
            );
            task.push(
                &[IconKind::BlueprintCopy],
                IconKind::BlueprintCopy.derived_filename(&source_hashes),
                layered(&art.bpc_background, &art.bpc_overlay),
            );
        }
    }

    fn classify_regular(&self, task: &mut ItemIconTask, info: &TypeInfo, category: CategoryId) {
        let mut icon = None;

        if let Some((graphic_id, folder)) = self.data.graphic_folder(info.graphic_id) {
            let render = BuildRules::graphic_texture(folder, graphic_id, "512.jpg");
            if let Some(render_hash) = self.hash_of(&render) {
                task.push(
                    &[IconKind::Render],
                    IconKind::Render.derived_filename(&[render_hash]),
                    Recipe::Copy { source: render },
                );
            }

            let graphic_icon = BuildRules::graphic_texture(folder, graphic_id, "64.png");
            if !self.rules.forces_icon(info.group_id) && self.cache.has(&graphic_icon) {
                icon = Some(graphic_icon);
            }
        }

        if icon.is_none() {
            icon = self.data.icon_file(info.icon_id).map(str::to_string);
        }

        if icon.is_none() && category == self.rules.skin_category {
            icon = self
                .data
                .skin_materials
                .get(&task.type_id)
                .map(|material| self.rules.skin_icon(*material));
        }

        let Some((icon, icon_hash)) =
            icon.and_then(|icon| self.hash_of(&icon).map(|hash| (icon, hash)))
        else {
            task.missing_icon = true;
            return;
        };

        let tech = self.tech_overlay(info);
        let tech_hash = tech.as_ref().map(|(_, hash)| hash.as_str());
        task.push(
            &[IconKind::Icon],
            IconKind::Icon.derived_filename(&hashes(&icon_hash, tech_hash)),
            badge_or_copy(icon, tech.as_ref()),
        );
    }

    /// Run the build. See the module docs for the algorithm.
    pub fn build(&self) -> Result<BuildOutcome> {
        std::fs::create_dir_all(self.icon_dir.as_std_path())?;

        let mut index = BuildIndex::load(&self.index_path(), self.options.force_rebuild)?;
        let mut metadata = ServiceMetadata::new();
        let mut report = BuildReport::default();

        tracing::info!("Building icons into {}", self.icon_dir);
        tracing::info!("Previous build: {} files", index.previous().len());

        let classify_start = Instant::now();
        let items = self.selected_items();
        let total = items.len();
        report.considered = total;

        let mut plan: BTreeMap<String, Recipe> = BTreeMap::new();
        for (position, (type_id, info, category)) in items.iter().enumerate() {
            self.report_progress(position + 1, total);

            let task = self.classify(*type_id, info, *category);
            if task.missing_icon {
                tracing::warn!("Missing icon for type {}", type_id);
                report.skipped.push(*type_id);
            }

            for variant in task.variants {
                let kinds = metadata.entry(*type_id).or_default();
                for kind in &variant.kinds {
                    kinds.insert(*kind, variant.filename.clone());
                }

                let up_to_date = index.already_built(&variant.filename);
                index.register(variant.filename.clone());
                if !up_to_date {
                    plan.entry(variant.filename).or_insert(variant.recipe);
                }
            }
        }
        if self.options.show_progress {
            tracing::info!("Classified {}/{} items", total, total);
        }
        report.timings.classify = classify_start.elapsed();

        let composite_start = Instant::now();
        tracing::info!("Compositing {} derived files...", plan.len());

        let results: Vec<(&String, Result<()>)> = plan
            .par_iter()
            .map(|(filename, recipe)| (filename, self.produce(filename, recipe)))
            .collect();

        for (filename, result) in results {
            match result {
                Ok(()) => report.composited += 1,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Dropping {}: {}", filename, e);
                    report.failed += 1;
                    index.unregister(filename);
                    drop_filename(&mut metadata, filename, &mut report.skipped);
                }
                Err(e) => return Err(e),
            }
        }
        report.timings.composite = composite_start.elapsed();
        report.reused = index.current().len() - report.composited;

        let delta = index.delta();
        report.to_add = delta.to_add.len();
        report.to_remove = delta.to_remove.len();

        tracing::info!(
            "Icons built: {} composited, {} reused, {} failed, {} skipped",
            report.composited,
            report.reused,
            report.failed,
            report.skipped.len()
        );

        Ok(BuildOutcome {
            index,
            metadata,
            report,
        })
    }

    fn produce(&self, filename: &str, recipe: &Recipe) -> Result<()> {
        tracing::debug!("Compositing {} from {:?}", filename, recipe.sources());
        let bytes = recipe.render(self.cache, filename)?;
        std::fs::write(self.icon_dir.join(filename).as_std_path(), bytes).map_err(Error::Io)
    }

    fn report_progress(&self, current: usize, total: usize) {
        if !self.options.show_progress || current % PROGRESS_INTERVAL != 0 {
            return;
        }
        let percentage = current as f64 / total as f64 * 100.0;
        tracing::info!("Build progress: {}/{} ({:.1}%)", current, total, percentage);
        if let Some(callback) = &self.progress_callback {
            callback(BuildProgress { current, total });
        }
    }
}

fn hashes(primary: &str, tech: Option<&str>) -> Vec<String> {
    let mut hashes = vec![primary.to_string()];
    hashes.extend(tech.map(str::to_string));
    hashes
}

fn badge_or_copy(source: String, tech: Option<&(String, String)>) -> Recipe {
    match tech {
        Some((tech, _)) => Recipe::Tech {
            icon: source,
            tech: tech.clone(),
        },
        None => Recipe::Copy { source },
    }
}

/// Remove every metadata entry pointing at `filename`. Items left without any
/// kind are dropped and counted as skipped.
fn drop_filename(metadata: &mut ServiceMetadata, filename: &str, skipped: &mut Vec<TypeId>) {
    metadata.retain(|type_id, kinds| {
        kinds.retain(|_, name| name != filename);
        if kinds.is_empty() {
            if !skipped.contains(type_id) {
                skipped.push(*type_id);
            }
            return false;
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::encode_png;
    use camino::Utf8PathBuf;
    use icon_cache::normalize_resource;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Resource map with fixed hashes, counting fetches.
    #[derive(Default)]
    struct FakeCache {
        resources: HashMap<String, (String, Vec<u8>)>,
        fetches: Mutex<Vec<String>>,
    }

    impl FakeCache {
        fn with(mut self, logical: &str, hash: &str, bytes: Vec<u8>) -> Self {
            self.resources
                .insert(normalize_resource(logical), (hash.to_string(), bytes));
            self
        }

        fn with_png(self, logical: &str, hash: &str, px: [u8; 4]) -> Self {
            let png = encode_png(&RgbaImage::from_pixel(64, 64, Rgba(px))).unwrap();
            self.with(logical, hash, png)
        }

        fn fetch_count(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }
    }

    impl SharedCache for FakeCache {
        fn version(&self) -> &str {
            "1"
        }

        fn resources(&self) -> Vec<String> {
            let mut names: Vec<String> = self.resources.keys().cloned().collect();
            names.sort();
            names
        }

        fn has(&self, logical: &str) -> bool {
            self.resources.contains_key(&normalize_resource(logical))
        }

        fn fetch(&self, logical: &str) -> icon_cache::Result<Vec<u8>> {
            self.fetches.lock().unwrap().push(logical.to_string());
            self.resources
                .get(&normalize_resource(logical))
                .map(|(_, bytes)| bytes.clone())
                .ok_or_else(|| icon_cache::Error::ResourceNotFound(logical.to_string()))
        }

        fn path_of(&self, logical: &str) -> icon_cache::Result<Utf8PathBuf> {
            Err(icon_cache::Error::ResourceNotFound(logical.to_string()))
        }

        fn hash_of(&self, logical: &str) -> icon_cache::Result<String> {
            self.resources
                .get(&normalize_resource(logical))
                .map(|(hash, _)| hash.clone())
                .ok_or_else(|| icon_cache::Error::ResourceNotFound(logical.to_string()))
        }
    }

    fn item(group_id: u32, icon_id: Option<u32>, graphic_id: Option<u32>, meta: Option<u32>) -> TypeInfo {
        TypeInfo {
            group_id,
            icon_id,
            graphic_id,
            meta_group_id: meta,
        }
    }

    fn catalog() -> IconBuildData {
        let mut data = IconBuildData::default();
        data.group_categories.extend([(25, 6), (100, 9), (1888, 9), (200, 34), (300, 91), (12, 6)]);
        data.icon_files.insert(7, "res:/ui/texture/icons/7_64_1.png".to_string());
        data.graphics_folders.insert(46, "res:/dx9/model/ship/mf1/".to_string());
        data
    }

    fn icon_dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().join("icons")).unwrap()
    }

    const TECH2: &str = "res:/ui/texture/icons/73_16_242.png";

    #[test]
    fn test_regular_icon_copy() {
        let cache = FakeCache::default().with_png("res:/ui/texture/icons/7_64_1.png", "h7", [1, 2, 3, 255]);
        let mut data = catalog();
        data.types.insert(587, item(25, Some(7), None, None));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let task = engine.classify(587, &data.types[&587], 6);

        assert!(!task.missing_icon);
        assert_eq!(task.variants.len(), 1);
        assert_eq!(task.variants[0].kinds, vec![IconKind::Icon]);
        assert_eq!(task.variants[0].filename, "h7.png");
        assert_eq!(
            task.variants[0].recipe,
            Recipe::Copy {
                source: "res:/ui/texture/icons/7_64_1.png".to_string()
            }
        );
    }

    #[test]
    fn test_regular_prefers_graphic_and_adds_render() {
        let cache = FakeCache::default()
            .with_png("res:/ui/texture/icons/7_64_1.png", "h7", [1, 2, 3, 255])
            .with_png("res:/dx9/model/ship/mf1/46_64.png", "g64", [1, 2, 3, 255])
            .with("res:/dx9/model/ship/mf1/46_512.jpg", "g512", vec![])
            .with_png(TECH2, "t2", [9, 9, 9, 255]);
        let mut data = catalog();
        data.types.insert(587, item(25, Some(7), Some(46), Some(2)));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let task = engine.classify(587, &data.types[&587], 6);

        let names: Vec<_> = task.variants.iter().map(|v| v.filename.as_str()).collect();
        assert_eq!(names, vec!["g512.jpg", "g64;t2.png"]);
        assert_eq!(task.variants[0].kinds, vec![IconKind::Render]);
        assert!(matches!(task.variants[1].recipe, Recipe::Tech { .. }));
    }

    #[test]
    fn test_force_icon_group_ignores_graphic() {
        let cache = FakeCache::default()
            .with_png("res:/ui/texture/icons/7_64_1.png", "h7", [1, 2, 3, 255])
            .with_png("res:/dx9/model/ship/mf1/46_64.png", "g64", [1, 2, 3, 255]);
        let mut data = catalog();
        data.types.insert(1, item(12, Some(7), Some(46), None));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let task = engine.classify(1, &data.types[&1], 6);
        assert_eq!(task.variants[0].filename, "h7.png");
    }

    #[test]
    fn test_skin_uses_material_icon() {
        let cache = FakeCache::default().with_png(
            "res:/ui/texture/classes/skins/icons/55.png",
            "skin55",
            [1, 1, 1, 255],
        );
        let mut data = catalog();
        data.types.insert(40000, item(300, None, None, None));
        data.skin_materials.insert(40000, 55);

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        assert_eq!(engine.selected_items().len(), 1);
        let task = engine.classify(40000, &data.types[&40000], 91);
        assert_eq!(task.variants[0].filename, "skin55.png");

        let engine = engine.with_options(BuildOptions {
            skip_skins: true,
            ..Default::default()
        });
        assert!(engine.selected_items().is_empty());
    }

    #[test]
    fn test_selection_rules() {
        let cache = FakeCache::default();
        let mut data = catalog();
        data.types.insert(1, item(25, Some(7), None, None));
        data.types.insert(2, item(25, None, None, None));
        data.types.insert(3, item(999, Some(7), None, None));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let ids: Vec<_> = engine.selected_items().iter().map(|(id, _, _)| *id).collect();
        assert_eq!(ids, vec![1]);

        let engine = engine.with_options(BuildOptions {
            test_type_id: Some(2),
            ..Default::default()
        });
        assert!(engine.selected_items().is_empty());
    }

    #[test]
    fn test_blueprint_graphic_with_tech_and_copy() {
        let cache = FakeCache::default()
            .with_png("res:/dx9/model/ship/mf1/46_64_bp.png", "gbp", [1, 2, 3, 255])
            .with_png("res:/dx9/model/ship/mf1/46_64_bpc.png", "gbpc", [1, 2, 3, 255])
            .with_png(TECH2, "t2", [9, 9, 9, 255]);
        let mut data = catalog();
        data.types.insert(688, item(100, Some(7), Some(46), Some(2)));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let task = engine.classify(688, &data.types[&688], 9);

        assert_eq!(task.variants.len(), 2);
        assert_eq!(task.variants[0].kinds, vec![IconKind::Icon, IconKind::Blueprint]);
        assert_eq!(task.variants[0].filename, "bp;gbp;t2.png");
        assert_eq!(task.variants[1].kinds, vec![IconKind::BlueprintCopy]);
        assert_eq!(task.variants[1].filename, "bpc;gbpc;t2.png");
    }

    #[test]
    fn test_blueprint_icon_fallback_variants() {
        let cache = FakeCache::default().with_png("res:/ui/texture/icons/7_64_1.png", "h7", [1, 2, 3, 255]);
        let mut data = catalog();
        data.types.insert(1, item(100, Some(7), None, None));
        data.types.insert(2, item(1888, Some(7), None, None));
        data.types.insert(3, item(200, Some(7), None, None));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));

        let bp = engine.classify(1, &data.types[&1], 9);
        let names: Vec<_> = bp.variants.iter().map(|v| v.filename.as_str()).collect();
        assert_eq!(names, vec!["bp;h7.png", "bpc;h7.png"]);

        let reaction = engine.classify(2, &data.types[&2], 9);
        assert_eq!(reaction.variants[0].filename, "reaction;h7.png");
        assert_eq!(
            reaction.variants[0].kinds,
            vec![IconKind::Icon, IconKind::Reaction, IconKind::Blueprint]
        );

        let relic = engine.classify(3, &data.types[&3], 34);
        assert_eq!(relic.variants[0].filename, "relic;h7.png");
        assert_eq!(relic.variants[0].kinds, vec![IconKind::Icon, IconKind::Relic]);
    }

    #[test]
    fn test_missing_icon_is_skipped_not_fatal() {
        let cache = FakeCache::default();
        let mut data = catalog();
        data.types.insert(5, item(25, Some(7), None, None));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let outcome = engine.build().unwrap();

        assert_eq!(outcome.report.skipped, vec![5]);
        assert!(outcome.metadata.is_empty());
        assert!(outcome.index.current().is_empty());
    }

    #[test]
    fn test_shared_art_is_composited_once() {
        let cache = FakeCache::default().with_png("res:/ui/texture/icons/7_64_1.png", "h7", [1, 2, 3, 255]);
        let mut data = catalog();
        data.types.insert(1, item(25, Some(7), None, None));
        data.types.insert(2, item(25, Some(7), None, None));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let outcome = engine.build().unwrap();

        assert_eq!(outcome.report.composited, 1);
        assert_eq!(cache.fetch_count(), 1);
        assert_eq!(outcome.metadata[&1][&IconKind::Icon], "h7.png");
        assert_eq!(outcome.metadata[&2][&IconKind::Icon], "h7.png");
    }

    #[test]
    fn test_second_build_reuses_everything() {
        let cache = FakeCache::default().with_png("res:/ui/texture/icons/7_64_1.png", "h7", [1, 2, 3, 255]);
        let mut data = catalog();
        data.types.insert(1, item(25, Some(7), None, None));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let first = engine.build().unwrap();
        first.index.save(&engine.index_path()).unwrap();
        let second = engine.build().unwrap();

        assert_eq!(second.report.composited, 0);
        assert_eq!(second.report.reused, 1);
        assert!(second.index.delta().is_empty());
        assert_eq!(cache.fetch_count(), 1);
    }

    #[test]
    fn test_unfetchable_source_drops_variant() {
        let cache = FakeCache::default()
            .with_png("res:/ui/texture/icons/7_64_1.png", "h7", [1, 2, 3, 255]);
        let mut data = catalog();
        data.types.insert(1, item(100, Some(7), None, None));

        // Blueprint art is not in the cache, so both composites fail to fetch.
        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let outcome = engine.build().unwrap();

        assert_eq!(outcome.report.failed, 2);
        assert!(outcome.index.current().is_empty());
        assert!(outcome.metadata.is_empty());
        assert_eq!(outcome.report.skipped, vec![1]);
    }

    #[test]
    fn test_corrupt_art_aborts_build() {
        let cache = FakeCache::default()
            .with("res:/ui/texture/icons/7_64_1.png", "h7", b"garbage".to_vec())
            .with_png(TECH2, "t2", [9, 9, 9, 255]);
        let mut data = catalog();
        data.types.insert(1, item(25, Some(7), None, Some(2)));

        let temp = TempDir::new().unwrap();
        let engine = IconBuildEngine::new(&data, &cache, icon_dir(&temp));
        let err = engine.build().unwrap_err();
        assert!(matches!(err, Error::Composition { ref filename, .. } if filename == "h7;t2.png"));
    }

    #[test]
    fn test_skipped_examples_are_capped() {
        let report = BuildReport {
            skipped: (0..25).collect(),
            ..Default::default()
        };
        assert_eq!(report.skipped_examples(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }
}
