//! File categorization by extension.
//!
//! The built-in table maps file extensions to a fixed set of categories. A
//! [`Classifier`] starts from that table and can be extended through
//! configuration, including the category used for anything it does not know.
//!
//! # Examples
//!
//! ```
//! use tidyfold::file_category::{Category, Classifier};
//!
//! let classifier = Classifier::default();
//! assert_eq!(classifier.classify("holiday.PNG"), Category::Images);
//! assert_eq!(classifier.classify("notes.txt"), Category::Documents);
//! assert_eq!(classifier.classify("mystery.xyz"), Category::Other);
//! ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Represents a broad file category.
///
/// The label of a category is also the name of the subfolder its files are
/// moved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Image files (PNG, JPG, GIF, etc.)
    Images,
    /// Document files (PDF, DOCX, TXT, etc.)
    Documents,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Audio,
    /// Video files (MP4, MKV, AVI, etc.)
    Video,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Source code and structured data files
    Code,
    /// Spreadsheet files (XLSX, CSV, ODS, etc.)
    Spreadsheets,
    /// Presentation files (PPTX, ODP, etc.)
    Presentations,
    /// Font files (TTF, OTF, WOFF, etc.)
    Fonts,
    /// Unknown or uncategorized files
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 10] = [
        Category::Images,
        Category::Documents,
        Category::Audio,
        Category::Video,
        Category::Archives,
        Category::Code,
        Category::Spreadsheets,
        Category::Presentations,
        Category::Fonts,
        Category::Other,
    ];

    /// Returns the subfolder name for this category.
    ///
    /// ```
    /// use tidyfold::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Spreadsheets => "Spreadsheets",
            Category::Presentations => "Presentations",
            Category::Fonts => "Fonts",
            Category::Other => "Other",
        }
    }

    /// Looks up the category whose subfolder is called `name`.
    pub fn from_dir_name(name: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

const STANDARD_EXTENSIONS: &[(&str, Category)] = &[
    // Images
    ("png", Category::Images),
    ("jpg", Category::Images),
    ("jpeg", Category::Images),
    ("gif", Category::Images),
    ("webp", Category::Images),
    ("svg", Category::Images),
    ("bmp", Category::Images),
    ("tiff", Category::Images),
    ("tif", Category::Images),
    ("ico", Category::Images),
    ("heic", Category::Images),
    // Documents
    ("pdf", Category::Documents),
    ("txt", Category::Documents),
    ("doc", Category::Documents),
    ("docx", Category::Documents),
    ("html", Category::Documents),
    ("htm", Category::Documents),
    ("md", Category::Documents),
    ("rtf", Category::Documents),
    ("odt", Category::Documents),
    ("epub", Category::Documents),
    // Audio
    ("mp3", Category::Audio),
    ("wav", Category::Audio),
    ("ogg", Category::Audio),
    ("flac", Category::Audio),
    ("aac", Category::Audio),
    ("m4a", Category::Audio),
    ("wma", Category::Audio),
    // Video
    ("mp4", Category::Video),
    ("mkv", Category::Video),
    ("avi", Category::Video),
    ("mov", Category::Video),
    ("flv", Category::Video),
    ("wmv", Category::Video),
    ("webm", Category::Video),
    ("3gp", Category::Video),
    // Archives
    ("zip", Category::Archives),
    ("rar", Category::Archives),
    ("7z", Category::Archives),
    ("tar", Category::Archives),
    ("gz", Category::Archives),
    ("bz2", Category::Archives),
    ("xz", Category::Archives),
    // Code
    ("py", Category::Code),
    ("java", Category::Code),
    ("c", Category::Code),
    ("cpp", Category::Code),
    ("h", Category::Code),
    ("hpp", Category::Code),
    ("js", Category::Code),
    ("ts", Category::Code),
    ("rs", Category::Code),
    ("go", Category::Code),
    ("sh", Category::Code),
    ("bash", Category::Code),
    ("json", Category::Code),
    ("xml", Category::Code),
    ("yaml", Category::Code),
    ("yml", Category::Code),
    ("toml", Category::Code),
    // Spreadsheets
    ("csv", Category::Spreadsheets),
    ("xls", Category::Spreadsheets),
    ("xlsx", Category::Spreadsheets),
    ("ods", Category::Spreadsheets),
    // Presentations
    ("ppt", Category::Presentations),
    ("pptx", Category::Presentations),
    ("odp", Category::Presentations),
    // Fonts
    ("ttf", Category::Fonts),
    ("otf", Category::Fonts),
    ("woff", Category::Fonts),
    ("woff2", Category::Fonts),
];

/// Maps file names and extensions to categories.
#[derive(Debug, Clone)]
pub struct Classifier {
    extension_map: HashMap<String, Category>,
    default_category: Category,
}

impl Classifier {
    /// Creates a classifier with the standard extension table and `Other` as
    /// the default category.
    pub fn new() -> Self {
        let mut classifier = Self {
            extension_map: HashMap::with_capacity(STANDARD_EXTENSIONS.len()),
            default_category: Category::Other,
        };
        for (ext, category) in STANDARD_EXTENSIONS {
            classifier.add_extension_mapping(ext, *category);
        }
        classifier
    }

    /// Replaces the category used for unknown extensions.
    pub fn with_default_category(mut self, category: Category) -> Self {
        self.default_category = category;
        self
    }

    /// Adds (or overrides) an extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.extension_map.insert(ext, category);
    }

    /// The category given to files with unknown extensions.
    pub fn default_category(&self) -> Category {
        self.default_category
    }

    /// Maps a file extension to a category, if it is known.
    ///
    /// ```
    /// use tidyfold::file_category::{Category, Classifier};
    ///
    /// let classifier = Classifier::default();
    /// assert_eq!(classifier.extension_to_category("PDF"), Some(Category::Documents));
    /// assert_eq!(classifier.extension_to_category("unknown"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.extension_map.get(&ext).copied()
    }

    /// Classifies a file name or a bare extension.
    ///
    /// `"report.pdf"`, `"pdf"` and `".pdf"` all land in the same category.
    /// Anything unknown falls back to the default category.
    pub fn classify(&self, name: &str) -> Category {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());

        self.extension_to_category(&ext)
            .unwrap_or(self.default_category)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_dir_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_dir_name(category.dir_name()), Some(category));
        }
        assert_eq!(Category::from_dir_name("images"), None);
    }

    #[test]
    fn test_classify_file_names() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("photo.jpg"), Category::Images);
        assert_eq!(classifier.classify("song.mp3"), Category::Audio);
        assert_eq!(classifier.classify("main.rs"), Category::Code);
        assert_eq!(classifier.classify("budget.xlsx"), Category::Spreadsheets);
        assert_eq!(classifier.classify("backup.tar.gz"), Category::Archives);
    }

    #[test]
    fn test_classify_bare_extensions() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("pdf"), Category::Documents);
        assert_eq!(classifier.classify(".pdf"), Category::Documents);
        assert_eq!(classifier.classify("MP4"), Category::Video);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("SCAN.PDF"), Category::Documents);
        assert_eq!(classifier.classify("Track.Flac"), Category::Audio);
    }

    #[test]
    fn test_unknown_goes_to_default() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("data.xyz"), Category::Other);
        assert_eq!(classifier.classify("README"), Category::Other);
        assert_eq!(classifier.classify(""), Category::Other);
    }

    #[test]
    fn test_custom_default_and_mapping() {
        let mut classifier = Classifier::new().with_default_category(Category::Documents);
        classifier.add_extension_mapping(".LOG", Category::Code);

        assert_eq!(classifier.default_category(), Category::Documents);
        assert_eq!(classifier.classify("server.log"), Category::Code);
        assert_eq!(classifier.classify("data.xyz"), Category::Documents);
    }
}
