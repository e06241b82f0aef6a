use std::path::Path;

/// Print a user-facing progress line (`=> message`).
pub fn say(message: &str) {
    println!("=> {message}");
}

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_path_strips_base() {
        let base = Path::new("/project");
        assert_eq!(
            display_path(Path::new("/project/test/fixtures/staff"), Some(base)),
            "test/fixtures/staff"
        );
        assert_eq!(display_path(Path::new("/elsewhere"), Some(base)), "/elsewhere");
        assert_eq!(display_path(Path::new("rel"), None), "rel");
    }
}
