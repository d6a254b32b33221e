//! End-to-end: check imports, write importcfg files to a scratch directory.

use camino::{Utf8Path, Utf8PathBuf};
use vx_importcfg::{
    Archive, CheckError, EmitError, ProvenanceSources, SourceFile, StdlibIndex, StdlibLayout,
    build_importcfg_for_compile, build_importcfg_for_link, check_imports,
};
use vx_modinfo::{MODINFO_END, MODINFO_START};

fn scratch() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    (dir, base)
}

fn files_in(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut entries: Vec<_> = dir
        .read_dir_utf8()
        .unwrap()
        .map(|e| e.unwrap().into_path())
        .collect();
    entries.sort();
    entries
}

#[test]
fn compile_importcfg_for_simple_package() {
    let (_dir, base) = scratch();
    let stdlib: StdlibIndex = ["fmt"].into_iter().collect();
    let archives = vec![Archive::new("pkg/a", "/out/a.x")];
    let files = vec![SourceFile::new("main.src", ["fmt", "pkg/a"])];

    let imports = check_imports(&files, &archives, &stdlib, "example.com/app", &[]).unwrap();
    let layout = StdlibLayout::new("/std", "linux_amd64");
    let path = build_importcfg_for_compile(&imports, &layout, &base).unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "packagefile fmt=/std/linux_amd64/fmt.a\npackagefile pkg/a=/out/a.x\n"
    );
}

#[test]
fn compile_importcfg_is_deterministic() {
    let (_dir, base) = scratch();
    let stdlib: StdlibIndex = ["fmt", "os", "strings"].into_iter().collect();
    let archives = vec![
        Archive::new("example.com/z", "/out/z.a"),
        Archive::new("example.com/m", "/out/m.a")
            .with_alias("vendor/example.com/m")
            .with_package_path("vendor/example.com/m"),
    ];
    let files = vec![
        SourceFile::new("b.src", ["strings", "example.com/z"]),
        SourceFile::new("a.src", ["os", "example.com/m", "fmt"]),
    ];
    let layout = StdlibLayout::new("/std", "linux_amd64");

    let first = {
        let imports = check_imports(&files, &archives, &stdlib, "example.com/app", &[]).unwrap();
        build_importcfg_for_compile(&imports, &layout, &base).unwrap()
    };
    let mut reversed = files.clone();
    reversed.reverse();
    let second = {
        let imports =
            check_imports(&reversed, &archives, &stdlib, "example.com/app", &[]).unwrap();
        build_importcfg_for_compile(&imports, &layout, &base).unwrap()
    };

    assert_ne!(first, second);
    let first = std::fs::read(&first).unwrap();
    let second = std::fs::read(&second).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        String::from_utf8(first).unwrap(),
        "importmap example.com/m=vendor/example.com/m\n\
         packagefile vendor/example.com/m=/out/m.a\n\
         packagefile example.com/z=/out/z.a\n\
         packagefile fmt=/std/linux_amd64/fmt.a\n\
         packagefile os=/std/linux_amd64/os.a\n\
         packagefile strings=/std/linux_amd64/strings.a\n"
    );
}

#[test]
fn missing_strict_dependency_writes_nothing() {
    let (_dir, base) = scratch();
    let stdlib: StdlibIndex = ["fmt"].into_iter().collect();
    let archives = vec![Archive::new("example.com/a", "/out/a.a")];
    let files = vec![SourceFile::new(
        "main.src",
        ["example.com/transitive", "example.com/a", "example.com/transitive"],
    )];

    let err = check_imports(&files, &archives, &stdlib, "example.com/app", &[]).unwrap_err();
    let CheckError::Missing(err) = err else {
        panic!("expected missing dependencies");
    };
    assert_eq!(err.missing.len(), 1);
    assert_eq!(err.missing[0].import_path, "example.com/transitive");
    assert_eq!(err.known, ["example.com/a"]);
    assert!(files_in(&base).is_empty());
}

#[test]
fn link_importcfg_with_provenance() {
    let (_dir, base) = scratch();
    let out = base.join("out");
    std::fs::create_dir(&out).unwrap();

    let stdlib_list = base.join("packages.txt");
    std::fs::write(&stdlib_list, "runtime\n\nfmt\n").unwrap();
    let manifest = base.join("module.mod");
    std::fs::write(&manifest, "module example.com/app\n\nrequire module v1.0.0\n").unwrap();
    let ledger = base.join("module.sum");
    std::fs::write(&ledger, "module v1.0.0 h1:abc\n").unwrap();

    let archives = vec![
        Archive::new("example.com/a", "/out/a.a").with_label("//a"),
        Archive::new("example.com/b", "/out/b.a").with_label("//b"),
    ];
    let provenance = ProvenanceSources {
        module_manifest: Some(manifest),
        checksum_ledger: Some(ledger),
    };
    let layout = StdlibLayout::new("/std", "linux_amd64");

    let path = build_importcfg_for_link(&archives, &stdlib_list, &layout, &provenance, &out)
        .unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();

    let mut block = MODINFO_START.to_vec();
    block.extend_from_slice(b"dep\tmodule\tv1.0.0\th1:abc\n");
    block.extend_from_slice(&MODINFO_END);
    let expected = format!(
        "packagefile runtime=/std/linux_amd64/runtime.a\n\
         packagefile fmt=/std/linux_amd64/fmt.a\n\
         packagefile example.com/a=/out/a.a\n\
         packagefile example.com/b=/out/b.a\n\
         modinfo {}\n",
        vx_modinfo::quote_bytes(&block)
    );
    assert_eq!(contents, expected);
}

#[test]
fn link_duplicate_package_writes_nothing() {
    let (_dir, base) = scratch();
    let out = base.join("out");
    std::fs::create_dir(&out).unwrap();
    let stdlib_list = base.join("packages.txt");
    std::fs::write(&stdlib_list, "fmt\n").unwrap();

    let archives = vec![
        Archive::new("example.com/a", "/out/a1.a").with_label("//a:one"),
        Archive::new("example.com/a", "/out/a2.a").with_label("//a:two"),
    ];
    let layout = StdlibLayout::new("/std", "linux_amd64");

    let err = build_importcfg_for_link(
        &archives,
        &stdlib_list,
        &layout,
        &ProvenanceSources::default(),
        &out,
    )
    .unwrap_err();

    assert!(matches!(err, EmitError::DuplicatePackage { .. }));
    assert!(files_in(&out).is_empty());
}

#[test]
fn link_without_stdlib_list_fails() {
    let (_dir, base) = scratch();
    let layout = StdlibLayout::new("/std", "linux_amd64");

    let err = build_importcfg_for_link(
        &[],
        &base.join("missing.txt"),
        &layout,
        &ProvenanceSources::default(),
        &base,
    )
    .unwrap_err();

    assert!(matches!(err, EmitError::Stdlib(_)));
    assert!(files_in(&base).is_empty());
}

#[test]
fn link_with_malformed_ledger_fails() {
    let (_dir, base) = scratch();
    let out = base.join("out");
    std::fs::create_dir(&out).unwrap();
    let stdlib_list = base.join("packages.txt");
    std::fs::write(&stdlib_list, "fmt\n").unwrap();
    let ledger = base.join("module.sum");
    std::fs::write(&ledger, "module v1.0.0\n").unwrap();

    let provenance = ProvenanceSources {
        module_manifest: None,
        checksum_ledger: Some(ledger),
    };
    let layout = StdlibLayout::new("/std", "linux_amd64");

    let err = build_importcfg_for_link(&[], &stdlib_list, &layout, &provenance, &out).unwrap_err();
    assert!(err.to_string().starts_with("internal error"));
    assert!(files_in(&out).is_empty());
}
