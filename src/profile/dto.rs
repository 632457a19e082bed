use serde::Serialize;

use crate::nutrition::goals::MacroSplit;
use crate::nutrition::tdee::TdeeEstimate;
use crate::nutrition::types::UserProfile;

/// Split request body; a missing field takes its default share.
#[derive(Debug, serde::Deserialize)]
pub struct MacroSplitRequest {
    #[serde(default = "default_protein")]
    pub protein: u32,
    #[serde(default = "default_carbs")]
    pub carbs: u32,
    #[serde(default = "default_fat")]
    pub fat: u32,
}

fn default_protein() -> u32 {
    MacroSplit::default().protein
}
fn default_carbs() -> u32 {
    MacroSplit::default().carbs
}
fn default_fat() -> u32 {
    MacroSplit::default().fat
}

impl From<MacroSplitRequest> for MacroSplit {
    fn from(r: MacroSplitRequest) -> Self {
        MacroSplit {
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TdeeApplied {
    pub estimate: TdeeEstimate,
    pub profile: UserProfile,
}
