use camino::Utf8PathBuf;
use icon_cache::{CacheDownloader, MemoryCdn, MemoryTransport};
use icon_export::compositor::{encode_jpeg, encode_png};
use icon_export::{
    build_icon_export, index_checksum, BuildIndex, BuildOptions, IconBuildData, IconBuildEngine,
    IconKind, LinkMode, OutputMode, TypeInfo, INDEX_FILE_NAME,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

const ICON: &str = "res:/ui/texture/icons/7_64_1.png";
const TECH2: &str = "res:/ui/texture/icons/73_16_242.png";
const GRAPHIC_BP: &str = "res:/dx9/model/ship/mf1/46_64_bp.png";
const GRAPHIC_BPC: &str = "res:/dx9/model/ship/mf1/46_64_bpc.png";
const RENDER: &str = "res:/dx9/model/ship/mf1/46_512.jpg";

fn png(size: u32, px: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(size, size, Rgba(px))).unwrap()
}

fn jpg() -> Vec<u8> {
    encode_jpeg(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        32,
        32,
        Rgba([40, 80, 120, 255]),
    )))
    .unwrap()
}

fn hash(bytes: &[u8]) -> String {
    MemoryCdn::content_hash(bytes)
}

struct Fixture {
    _temp: TempDir,
    root: Utf8PathBuf,
    cache: CacheDownloader,
    transport: Arc<MemoryTransport>,
}

impl Fixture {
    fn new(cdn: MemoryCdn) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let endpoints = cdn.endpoints().clone();
        let transport = Arc::new(cdn.into_transport());
        let cache = CacheDownloader::with_transport(
            root.join("cache"),
            endpoints,
            Box::new(Arc::clone(&transport)),
        )
        .unwrap();

        Self {
            _temp: temp,
            root,
            cache,
            transport,
        }
    }

    fn icon_dir(&self) -> Utf8PathBuf {
        self.root.join("icons")
    }

    fn out(&self, name: &str) -> Utf8PathBuf {
        self.root.join("out").join(name)
    }

    fn engine<'a>(&'a self, data: &'a IconBuildData) -> IconBuildEngine<'a> {
        IconBuildEngine::new(data, &self.cache, self.icon_dir())
    }
}

fn catalog(types: &[(u32, TypeInfo)]) -> IconBuildData {
    let mut data = IconBuildData::default();
    data.types.extend(types.iter().copied());
    data.group_categories.extend([(25, 6), (100, 9)]);
    data.icon_files.insert(7, ICON.to_string());
    data.graphics_folders
        .insert(46, "res:/dx9/model/ship/mf1".to_string());
    data
}

fn item(group_id: u32, icon_id: Option<u32>, graphic_id: Option<u32>, meta: Option<u32>) -> TypeInfo {
    TypeInfo {
        group_id,
        icon_id,
        graphic_id,
        meta_group_id: meta,
    }
}

fn read_zip(path: &Utf8PathBuf) -> BTreeMap<String, Vec<u8>> {
    let file = std::fs::File::open(path.as_std_path()).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        entries.insert(entry.name().to_string(), bytes);
    }
    entries
}

#[test]
fn test_single_item_service_bundle() {
    let icon = png(64, [200, 10, 10, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon.clone()));
    let data = catalog(&[(587, item(25, Some(7), None, None))]);
    let engine = fixture.engine(&data);

    let out = fixture.out("bundle.zip");
    let report = build_icon_export(&engine, &OutputMode::ServiceBundle { out: out.clone() }, true)
        .unwrap();

    let filename = format!("{}.png", hash(&icon));
    assert_eq!(report.to_add, 1);
    assert_eq!(report.composited, 1);
    assert!(!report.output_skipped);

    let entries = read_zip(&out);
    assert_eq!(entries[&filename], icon);

    let metadata: serde_json::Value =
        serde_json::from_slice(&entries["service_metadata.json"]).unwrap();
    assert_eq!(metadata, serde_json::json!({ "587": { "icon": filename } }));

    let index = std::fs::read(fixture.icon_dir().join(INDEX_FILE_NAME).as_std_path()).unwrap();
    assert_eq!(index, filename.as_bytes());
}

#[test]
fn test_unchanged_rebuild_skips_output_and_downloads() {
    let icon = png(64, [200, 10, 10, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon.clone()));
    let data = catalog(&[(587, item(25, Some(7), None, None))]);
    let engine = fixture.engine(&data);
    let mode = OutputMode::ServiceBundle {
        out: fixture.out("bundle.zip"),
    };

    build_icon_export(&engine, &mode, true).unwrap();
    let requests = fixture.transport.requests().len();

    let second = build_icon_export(&engine, &mode, true).unwrap();
    assert!(second.output_skipped);
    assert_eq!(second.to_add, 0);
    assert_eq!(second.to_remove, 0);
    assert_eq!(second.composited, 0);
    assert_eq!(fixture.transport.requests().len(), requests);
}

#[test]
fn test_blueprint_graphic_with_tech_overlay() {
    let bp = png(64, [10, 10, 200, 255]);
    let bpc = png(64, [10, 200, 10, 255]);
    let tech = png(16, [255, 255, 0, 255]);
    let fixture = Fixture::new(
        MemoryCdn::new("100")
            .with_resource(GRAPHIC_BP, bp.clone())
            .with_resource(GRAPHIC_BPC, bpc.clone())
            .with_resource(TECH2, tech.clone()),
    );
    let data = catalog(&[(688, item(100, None, Some(46), Some(2)))]);
    let engine = fixture.engine(&data);

    let out = fixture.out("iec.zip");
    build_icon_export(&engine, &OutputMode::Iec { out: out.clone() }, false).unwrap();

    let bp_name = format!("bp;{};{}.png", hash(&bp), hash(&tech));
    let bpc_name = format!("bpc;{};{}.png", hash(&bpc), hash(&tech));
    let icon_dir = fixture.icon_dir();
    assert!(icon_dir.join(&bp_name).exists());
    assert!(icon_dir.join(&bpc_name).exists());

    let entries = read_zip(&out);
    let names: Vec<_> = entries.keys().cloned().collect();
    assert_eq!(names, vec!["688_64.png", "688_bpc_64.png"]);

    let composited = image::load_from_memory(&entries["688_64.png"]).unwrap().to_rgba8();
    assert_eq!(composited.dimensions(), (64, 64));
    assert_eq!(composited.get_pixel(4, 4).0, [255, 255, 0, 255]);
    assert_eq!(composited.get_pixel(40, 40).0, [10, 10, 200, 255]);
}

#[test]
fn test_shared_art_is_built_once_across_items() {
    let icon = png(64, [1, 2, 3, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon.clone()));
    let data = catalog(&[
        (1, item(25, Some(7), None, None)),
        (2, item(25, Some(7), None, None)),
        (3, item(25, Some(7), None, None)),
    ]);
    let engine = fixture.engine(&data);

    let outcome = engine.build().unwrap();
    let filename = format!("{}.png", hash(&icon));
    assert_eq!(outcome.report.composited, 1);
    assert_eq!(outcome.index.current().len(), 1);
    for type_id in [1, 2, 3] {
        assert_eq!(outcome.metadata[&type_id][&IconKind::Icon], filename);
    }
}

#[test]
fn test_removed_item_deletes_stale_file() {
    let icon = png(64, [1, 2, 3, 255]);
    let render = jpg();
    let fixture = Fixture::new(
        MemoryCdn::new("100")
            .with_resource(ICON, icon.clone())
            .with_resource(RENDER, render.clone()),
    );
    let mode = OutputMode::Checksum { out: None };

    let data = catalog(&[
        (587, item(25, Some(7), None, None)),
        (588, item(25, None, Some(46), None)),
    ]);
    let first = build_icon_export(&fixture.engine(&data), &mode, false).unwrap();
    assert_eq!(first.to_add, 2);

    let render_name = format!("{}.jpg", hash(&render));
    assert!(fixture.icon_dir().join(&render_name).exists());

    let data = catalog(&[(587, item(25, Some(7), None, None))]);
    let second = build_icon_export(&fixture.engine(&data), &mode, false).unwrap();
    assert_eq!(second.to_add, 0);
    assert_eq!(second.to_remove, 1);
    assert!(!fixture.icon_dir().join(&render_name).exists());
}

#[test]
fn test_failed_output_is_retried_next_run() {
    let icon = png(64, [1, 2, 3, 255]);
    let render = jpg();
    let fixture = Fixture::new(
        MemoryCdn::new("100")
            .with_resource(ICON, icon.clone())
            .with_resource(RENDER, render.clone()),
    );
    let data = catalog(&[
        (587, item(25, Some(7), None, None)),
        (588, item(25, None, Some(46), None)),
    ]);
    build_icon_export(&fixture.engine(&data), &OutputMode::Checksum { out: None }, false)
        .unwrap();
    let render_name = format!("{}.jpg", hash(&render));

    // The bundle path is taken by a directory, so writing it fails.
    let data = catalog(&[(587, item(25, Some(7), None, None))]);
    let blocked = fixture.out("blocked");
    std::fs::create_dir_all(blocked.as_std_path()).unwrap();
    let result = build_icon_export(
        &fixture.engine(&data),
        &OutputMode::ServiceBundle { out: blocked },
        true,
    );
    assert!(result.is_err());
    assert!(fixture.icon_dir().join(&render_name).exists());

    let out = fixture.out("retry.zip");
    let report = build_icon_export(
        &fixture.engine(&data),
        &OutputMode::ServiceBundle { out: out.clone() },
        true,
    )
    .unwrap();
    assert!(!report.output_skipped);
    assert_eq!(report.to_remove, 1);
    assert_eq!(read_zip(&out)[&format!("{}.png", hash(&icon))], icon);
    assert!(!fixture.icon_dir().join(&render_name).exists());
}

#[test]
fn test_checksum_is_deterministic() {
    let icon = png(64, [1, 2, 3, 255]);
    let tech = png(16, [9, 9, 9, 255]);
    let cdn = MemoryCdn::new("100")
        .with_resource(ICON, icon)
        .with_resource(TECH2, tech);
    let data = catalog(&[
        (1, item(25, Some(7), None, Some(2))),
        (2, item(100, Some(7), None, None)),
    ]);

    let mut digests = Vec::new();
    for _ in 0..2 {
        let fixture = Fixture::new(cdn.clone());
        let engine = fixture.engine(&data);
        let out = fixture.out("checksum.txt");
        let report =
            build_icon_export(&engine, &OutputMode::Checksum { out: Some(out.clone()) }, false)
                .unwrap();

        let digest = report.checksum.unwrap();
        assert_eq!(std::fs::read_to_string(out.as_std_path()).unwrap(), digest);

        let index = BuildIndex::load(&fixture.icon_dir().join(INDEX_FILE_NAME), false).unwrap();
        let mut reloaded = BuildIndex::new(Default::default(), false);
        for name in index.previous() {
            reloaded.register(name.clone());
        }
        assert_eq!(index_checksum(&reloaded), digest);
        digests.push(digest);
    }

    assert_eq!(digests[0], digests[1]);
    assert_eq!(digests[0].len(), 64);
}

#[test]
fn test_web_dir_links_and_prunes() {
    let icon = png(64, [1, 2, 3, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon.clone()));
    let out = fixture.out("web");
    let mode = OutputMode::WebDir {
        out: out.clone(),
        link: LinkMode::Copy,
    };

    let data = catalog(&[
        (587, item(25, Some(7), None, None)),
        (588, item(25, Some(7), None, None)),
    ]);
    build_icon_export(&fixture.engine(&data), &mode, false).unwrap();

    assert_eq!(
        std::fs::read(out.join("587_icon.png").as_std_path()).unwrap(),
        icon
    );
    assert_eq!(
        std::fs::read_to_string(out.join("587.json").as_std_path()).unwrap(),
        r#"["icon"]"#
    );
    let index: BTreeMap<String, String> =
        serde_json::from_slice(&std::fs::read(out.join("index.json").as_std_path()).unwrap())
            .unwrap();
    assert_eq!(index["588_icon.png"], format!("{}.png", hash(&icon)));

    let data = catalog(&[(587, item(25, Some(7), None, None))]);
    build_icon_export(&fixture.engine(&data), &mode, false).unwrap();
    assert!(out.join("587_icon.png").exists());
    assert!(!out.join("588_icon.png").exists());
    assert!(!out.join("588.json").exists());
}

#[test]
fn test_web_dir_link_failure_is_retried() {
    let icon = png(64, [1, 2, 3, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon.clone()));
    let out = fixture.out("web");
    let mode = OutputMode::WebDir {
        out: out.clone(),
        link: LinkMode::Copy,
    };
    let data = catalog(&[(587, item(25, Some(7), None, None))]);

    let obstruction = out.join("587_icon.png");
    std::fs::create_dir_all(obstruction.as_std_path()).unwrap();
    std::fs::write(obstruction.join("keep").as_std_path(), b"x").unwrap();

    build_icon_export(&fixture.engine(&data), &mode, false).unwrap();
    let index: BTreeMap<String, String> =
        serde_json::from_slice(&std::fs::read(out.join("index.json").as_std_path()).unwrap())
            .unwrap();
    assert!(!index.contains_key("587_icon.png"));
    assert!(index.contains_key("587.json"));

    std::fs::remove_dir_all(obstruction.as_std_path()).unwrap();
    build_icon_export(&fixture.engine(&data), &mode, false).unwrap();
    assert_eq!(std::fs::read(obstruction.as_std_path()).unwrap(), icon);
    let index: BTreeMap<String, String> =
        serde_json::from_slice(&std::fs::read(out.join("index.json").as_std_path()).unwrap())
            .unwrap();
    assert_eq!(index["587_icon.png"], format!("{}.png", hash(&icon)));
}

#[test]
fn test_web_dir_hardlinks() {
    let icon = png(64, [1, 2, 3, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon.clone()));
    let out = fixture.out("web");
    let data = catalog(&[(587, item(25, Some(7), None, None))]);

    build_icon_export(
        &fixture.engine(&data),
        &OutputMode::WebDir {
            out: out.clone(),
            link: LinkMode::HardLink,
        },
        false,
    )
    .unwrap();

    let link = out.join("587_icon.png");
    let metadata = std::fs::symlink_metadata(link.as_std_path()).unwrap();
    assert!(metadata.file_type().is_file());
    assert_eq!(std::fs::read(link.as_std_path()).unwrap(), icon);

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        assert_eq!(metadata.nlink(), 2);
    }
}

#[cfg(unix)]
#[test]
fn test_web_dir_symlinks_point_into_icon_dir() {
    let icon = png(64, [1, 2, 3, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon.clone()));
    let out = fixture.out("web");
    let data = catalog(&[(587, item(25, Some(7), None, None))]);

    build_icon_export(
        &fixture.engine(&data),
        &OutputMode::WebDir {
            out: out.clone(),
            link: LinkMode::Symlink,
        },
        false,
    )
    .unwrap();

    let link = out.join("587_icon.png");
    let target = std::fs::read_link(link.as_std_path()).unwrap();
    assert!(target.ends_with(format!("{}.png", hash(&icon))));
    assert_eq!(std::fs::read(link.as_std_path()).unwrap(), icon);
}

#[test]
fn test_aux_dumps() {
    let icon = png(64, [1, 2, 3, 255]);
    let render = jpg();
    let fixture = Fixture::new(
        MemoryCdn::new("100")
            .with_resource(ICON, icon.clone())
            .with_resource(RENDER, render.clone())
            .with_resource("res:/staticdata/types.json", b"{}".to_vec()),
    );
    let mut data = catalog(&[(587, item(25, Some(7), None, None))]);
    data.icon_files
        .insert(8, "res:/ui/texture/icons/missing.png".to_string());

    let out = fixture.out("aux_icons.zip");
    build_icon_export(
        &fixture.engine(&data),
        &OutputMode::AuxIcons { out: out.clone() },
        false,
    )
    .unwrap();
    let entries = read_zip(&out);
    assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["7.png"]);
    assert_eq!(entries["7.png"], icon);

    let out = fixture.out("aux_all.zip");
    build_icon_export(
        &fixture.engine(&data),
        &OutputMode::AuxAll { out: out.clone() },
        false,
    )
    .unwrap();
    let entries = read_zip(&out);
    assert_eq!(
        entries.keys().collect::<Vec<_>>(),
        vec!["dx9/model/ship/mf1/46_512.jpg", "ui/texture/icons/7_64_1.png"]
    );
    assert_eq!(entries["dx9/model/ship/mf1/46_512.jpg"], render);
}

#[test]
fn test_force_rebuild_recomposites() {
    let icon = png(64, [1, 2, 3, 255]);
    let fixture = Fixture::new(MemoryCdn::new("100").with_resource(ICON, icon));
    let data = catalog(&[(587, item(25, Some(7), None, None))]);
    let mode = OutputMode::Checksum { out: None };

    build_icon_export(&fixture.engine(&data), &mode, true).unwrap();

    let engine = fixture.engine(&data).with_options(BuildOptions {
        force_rebuild: true,
        ..Default::default()
    });
    let report = build_icon_export(&engine, &mode, true).unwrap();
    assert_eq!(report.composited, 1);
    assert_eq!(report.to_add, 0);
    assert!(report.output_skipped);
}
