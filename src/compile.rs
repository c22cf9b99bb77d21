use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::naming::Layout;

/// Concatenates `chapters` into the build file and mirrors `src/images` into
/// `build/images`. Returns the build file path.
pub fn compile(layout: &Layout, chapters: &[PathBuf]) -> anyhow::Result<PathBuf> {
    let build_dir = layout.build_dir();
    std::fs::create_dir_all(&build_dir)
        .with_context(|| format!("create build dir: {}", build_dir.display()))?;

    let mut bundled: Vec<u8> = Vec::new();
    for chapter_path in chapters {
        let chapter = std::fs::read(chapter_path)
            .with_context(|| format!("read chapter: {}", chapter_path.display()))?;
        bundled.extend_from_slice(&chapter);
        if chapter.last().is_some_and(|last| *last != b'\n') {
            bundled.push(b'\n');
        }
    }

    let out_path = layout.build_file();
    let mut out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&out_path)
        .with_context(|| format!("open build output: {}", out_path.display()))?;
    out.write_all(&bundled)
        .with_context(|| format!("write build output: {}", out_path.display()))?;
    out.flush()
        .with_context(|| format!("flush build output: {}", out_path.display()))?;

    let images_dir = layout.images_dir();
    if images_dir.exists() {
        copy_dir_recursive(&images_dir, &build_dir.join(crate::naming::IMAGES_FOLDER))
            .context("copy images")?;
    }

    tracing::info!(
        chapters = chapters.len(),
        out = %out_path.display(),
        "compiled book"
    );
    Ok(out_path)
}

fn copy_dir_recursive(from: &Path, to: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(to).with_context(|| format!("create dir: {}", to.display()))?;

    let mut entries = std::fs::read_dir(from)
        .with_context(|| format!("read dir: {}", from.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("list dir: {}", from.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().context("read file type")?;
        if file_type.is_dir() {
            copy_dir_recursive(&path, &target)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        std::fs::copy(&path, &target)
            .with_context(|| format!("copy {} to {}", path.display(), target.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapters_are_joined_with_trailing_newlines() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let layout = Layout::new(temp.path());
        std::fs::create_dir_all(layout.images_dir().join("01"))?;
        std::fs::write(layout.images_dir().join("01").join("map.png"), "png")?;
        let first = layout.chapter_path_for(0, "Intro");
        let second = layout.chapter_path_for(1, "Middle");
        std::fs::write(&first, "## Intro")?;
        std::fs::write(&second, "## Middle\n\nText\n")?;

        let out = compile(&layout, &[first, second])?;

        assert_eq!(
            std::fs::read_to_string(&out)?,
            "## Intro\n## Middle\n\nText\n"
        );
        assert_eq!(
            std::fs::read_to_string(layout.build_dir().join("images").join("01").join("map.png"))?,
            "png"
        );
        Ok(())
    }

    #[test]
    fn compiling_again_overwrites_the_build() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let layout = Layout::new(temp.path());
        std::fs::create_dir_all(layout.src_dir())?;
        let chapter = layout.chapter_path_for(0, "Intro");
        std::fs::write(&chapter, "## Intro\nfirst draft\n")?;
        compile(&layout, std::slice::from_ref(&chapter))?;

        std::fs::write(&chapter, "## Intro\n")?;
        let out = compile(&layout, &[chapter])?;
        assert_eq!(std::fs::read_to_string(out)?, "## Intro\n");
        Ok(())
    }

    #[test]
    fn chapter_bytes_pass_through_unchanged() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let layout = Layout::new(temp.path());
        std::fs::create_dir_all(layout.src_dir())?;
        let latin1 = layout.chapter_path_for(0, "Intro");
        let second = layout.chapter_path_for(1, "Fin");
        std::fs::write(&latin1, b"## Cap\xedtulo")?;
        std::fs::write(&second, "## Fin\n")?;

        let out = compile(&layout, &[latin1, second])?;

        assert_eq!(std::fs::read(out)?, b"## Cap\xedtulo\n## Fin\n");
        Ok(())
    }

    #[test]
    fn empty_chapter_adds_nothing() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let layout = Layout::new(temp.path());
        std::fs::create_dir_all(layout.src_dir())?;
        let empty = layout.chapter_path_for(0, "A");
        let second = layout.chapter_path_for(1, "B");
        std::fs::write(&empty, "")?;
        std::fs::write(&second, "## B")?;

        let out = compile(&layout, &[empty, second])?;

        assert_eq!(std::fs::read_to_string(out)?, "## B\n");
        Ok(())
    }
}
