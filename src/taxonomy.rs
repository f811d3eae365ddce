//! The fixed six-member art taxonomy.
//!
//! Categories travel under two spellings: the storage vocabulary persisted on
//! event rows and the identifier vocabulary the UI uses for filter keys. The
//! table below is the only place the two are tied together.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const NEUTRAL_COLOR: &str = "#808080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Música")]
    Music,
    #[serde(rename = "Teatro")]
    Theater,
    #[serde(rename = "Artes Visuales")]
    Visual,
    #[serde(rename = "Literatura")]
    Literature,
    #[serde(rename = "Cine")]
    Cinema,
    #[serde(rename = "Otro")]
    Other,
}

struct Entry {
    category: Category,
    ui_key: &'static str,
    storage: &'static str,
    color: &'static str,
}

const TABLE: [Entry; 6] = [
    Entry {
        category: Category::Music,
        ui_key: "music",
        storage: "Música",
        color: "#e63946",
    },
    Entry {
        category: Category::Theater,
        ui_key: "theater",
        storage: "Teatro",
        color: "#f4a261",
    },
    Entry {
        category: Category::Visual,
        ui_key: "visual",
        storage: "Artes Visuales",
        color: "#2a9d8f",
    },
    Entry {
        category: Category::Literature,
        ui_key: "literature",
        storage: "Literatura",
        color: "#264653",
    },
    Entry {
        category: Category::Cinema,
        ui_key: "cinema",
        storage: "Cine",
        color: "#9b5de5",
    },
    Entry {
        category: Category::Other,
        ui_key: "other",
        storage: "Otro",
        color: "#6c757d",
    },
];

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Music,
        Category::Theater,
        Category::Visual,
        Category::Literature,
        Category::Cinema,
        Category::Other,
    ];

    fn entry(self) -> &'static Entry {
        // TABLE is declared in the same order as the enum.
        &TABLE[self as usize]
    }

    pub fn ui_key(self) -> &'static str {
        self.entry().ui_key
    }

    pub fn storage_label(self) -> &'static str {
        self.entry().storage
    }

    pub fn color(self) -> &'static str {
        self.entry().color
    }

    pub fn from_ui_key(key: &str) -> Option<Self> {
        let key = key.trim();
        TABLE
            .iter()
            .find(|entry| entry.ui_key.eq_ignore_ascii_case(key))
            .map(|entry| entry.category)
    }

    pub fn from_storage(label: &str) -> Option<Self> {
        let label = label.trim();
        TABLE
            .iter()
            .find(|entry| entry.storage == label)
            .map(|entry| entry.category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_label())
    }
}

/// Storage spelling → UI key.
pub fn storage_to_ui(label: &str) -> Option<&'static str> {
    Category::from_storage(label).map(Category::ui_key)
}

/// UI key → storage spelling.
pub fn ui_to_storage(key: &str) -> Option<&'static str> {
    Category::from_ui_key(key).map(Category::storage_label)
}

/// Marker color for a storage-vocabulary tag, neutral when the tag is unknown.
pub fn color_for_storage_tag(label: &str) -> &'static str {
    Category::from_storage(label)
        .map(Category::color)
        .unwrap_or(NEUTRAL_COLOR)
}
