use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LabelId = Uuid;

const LABEL_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_3c0e_8a4d_4f5e_9c2b_7d1e_0a6f_5b3c);

const PALETTE: [&str; 8] = [
    "#e57373", "#f06292", "#ba68c8", "#7986cb", "#4fc3f7", "#4db6ac", "#aed581", "#ffb74d",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub color: String,
}

impl Label {
    /// Labels are identified by name and color together, so two tags that
    /// share a name but differ in color stay distinct.
    pub fn new(name: String, color: String) -> Self {
        Self {
            id: Self::derive_id(&name, &color),
            name,
            color,
        }
    }

    /// Label with a color picked from the palette by name.
    pub fn with_default_color(name: String) -> Self {
        let color = Self::default_color(&name).to_string();
        Self::new(name, color)
    }

    pub fn derive_id(name: &str, color: &str) -> LabelId {
        let key = format!("{}\u{1f}{}", name.to_lowercase(), color.to_lowercase());
        Uuid::new_v5(&LABEL_NAMESPACE, key.as_bytes())
    }

    pub fn default_color(name: &str) -> &'static str {
        let hash = name
            .to_lowercase()
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        PALETTE[hash as usize % PALETTE.len()]
    }
}
