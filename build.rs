use std::process::Command;

// Stamps the release tag into the user agent and version label.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GIT_TAG");

    if let Ok(tag) = std::env::var("GIT_TAG") {
        if !tag.trim().is_empty() {
            println!("cargo:rustc-env=GIT_TAG={}", tag.trim());
            return;
        }
    }

    let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--abbrev=0"])
        .output()
    else {
        return;
    };

    if output.status.success() {
        if let Ok(tag) = String::from_utf8(output.stdout) {
            let tag = tag.trim();
            if !tag.is_empty() {
                println!("cargo:rustc-env=GIT_TAG={tag}");
            }
        }
    }
}
