//! The CJK font asset used by every output run.

use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};

use crate::error::{Error, Result};

/// Characters probed to confirm a font can render Chinese text.
const PROBE_CHARS: [char; 3] = ['中', '文', '的'];

/// Known font files and the family name Word knows them by.
const KNOWN_FAMILIES: &[(&str, &str)] = &[
    ("simsun", "SimSun"),
    ("simhei", "SimHei"),
    ("simkai", "KaiTi"),
    ("simfang", "FangSong"),
    ("msyh", "Microsoft YaHei"),
    ("msjh", "Microsoft JhengHei"),
    ("notosanscjk", "Noto Sans CJK SC"),
    ("notoserifcjk", "Noto Serif CJK SC"),
    ("notosanssc", "Noto Sans SC"),
    ("notoserifsc", "Noto Serif SC"),
    ("sourcehansans", "Source Han Sans SC"),
    ("sourcehanserif", "Source Han Serif SC"),
    ("wqy-microhei", "WenQuanYi Micro Hei"),
    ("wqy-zenhei", "WenQuanYi Zen Hei"),
];

/// A CJK-capable font, referenced by family name in the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    /// Source file, if the font was loaded from disk
    pub path: Option<PathBuf>,
    /// Family name written into the document
    pub family: String,
}

impl FontAsset {
    /// Load and validate a font file.
    ///
    /// Fails with [`Error::FontAsset`] if the file is missing, is not a
    /// parseable font, or has none of the probe CJK glyphs. `family`
    /// overrides the name derived from the file name.
    pub fn load<P: AsRef<Path>>(path: P, family: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::FontAsset(format!("cannot read {}: {}", path.display(), e)))?;
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| Error::FontAsset(format!("{} is not a usable font: {}", path.display(), e)))?;

        if !PROBE_CHARS.iter().any(|c| font.lookup_glyph_index(*c) != 0) {
            return Err(Error::FontAsset(format!(
                "{} has no Chinese glyphs",
                path.display()
            )));
        }

        let family = family
            .map(str::to_string)
            .unwrap_or_else(|| family_for_path(path));
        log::info!("Using font {} from {}", family, path.display());

        Ok(Self {
            path: Some(path.to_path_buf()),
            family,
        })
    }

    /// Reference an installed font by family name without loading it.
    pub fn named(family: impl Into<String>) -> Self {
        Self {
            path: None,
            family: family.into(),
        }
    }
}

/// Family name for a font file, from the known table or the file stem.
pub fn family_for_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let key = stem.to_lowercase();
    KNOWN_FAMILIES
        .iter()
        .find(|(prefix, _)| key.starts_with(prefix))
        .map(|(_, family)| family.to_string())
        .unwrap_or(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_family_for_path() {
        assert_eq!(family_for_path(Path::new("C:/Windows/Fonts/simsun.ttc")), "SimSun");
        assert_eq!(
            family_for_path(Path::new("/usr/share/fonts/NotoSansCJK-Regular.ttc")),
            "Noto Sans CJK SC"
        );
        assert_eq!(family_for_path(Path::new("MyFont.ttf")), "MyFont");
    }

    #[test]
    fn test_missing_font_is_error() {
        let result = FontAsset::load("/nonexistent/font.ttf", None);
        assert!(matches!(result, Err(Error::FontAsset(_))));
    }

    #[test]
    fn test_garbage_font_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a font at all").unwrap();
        let result = FontAsset::load(file.path(), Some("Fake"));
        assert!(matches!(result, Err(Error::FontAsset(_))));
    }

    #[test]
    fn test_named() {
        let font = FontAsset::named("SimSun");
        assert_eq!(font.family, "SimSun");
        assert!(font.path.is_none());
    }
}
