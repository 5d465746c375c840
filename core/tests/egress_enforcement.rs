use std::fs;
use std::path::{Path, PathBuf};

const FORBIDDEN: [&str; 6] = [
    "reqwest::",
    "ureq::",
    "surf::",
    "hyper::Client",
    "std::net::TcpStream",
    "std::net::UdpSocket",
];

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

#[test]
fn http_client_is_only_named_in_the_egress_module() {
    let root = workspace_root();
    let allowed = root.join("core").join("src").join("policy").join("egress.rs");

    let mut files = Vec::new();
    walk_rs(&root.join("core").join("src"), &mut files);
    walk_rs(&root.join("tools").join("incident_alert").join("src"), &mut files);
    assert!(files.contains(&allowed));

    for f in files.iter().filter(|f| **f != allowed) {
        let text = fs::read_to_string(f).unwrap();
        for tok in FORBIDDEN {
            assert!(
                !text.contains(tok),
                "forbidden egress token '{}' in {}",
                tok,
                f.display()
            );
        }
    }
}

#[test]
fn egress_module_checks_policy_before_sending() {
    let text = fs::read_to_string(
        workspace_root()
            .join("core")
            .join("src")
            .join("policy")
            .join("egress.rs"),
    )
    .unwrap();
    assert!(text.contains("reqwest::blocking::Client"));
    assert!(text.contains("fn check("));
}

fn walk_rs(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for ent in entries.flatten() {
        let p = ent.path();
        if p.is_dir() {
            walk_rs(&p, out);
        } else if p.extension().and_then(|x| x.to_str()) == Some("rs") {
            out.push(p);
        }
    }
}
