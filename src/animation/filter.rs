use glam::Quat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Filter entry that excludes left-side bones (`*_L`).
pub const EXCLUDE_LEFT: &str = "!L";
/// Filter entry that excludes right-side bones (`*_R`).
pub const EXCLUDE_RIGHT: &str = "!R";

const LEFT_SUFFIX: &str = "_L";
const RIGHT_SUFFIX: &str = "_R";

/// Restricts pose application to bones whose names start with one of the
/// listed prefixes.
///
/// The entries `"!L"` and `"!R"` are not prefixes; they drop bones ending in
/// `_L` / `_R` respectively. An empty filter passes every bone.
///
/// Serialises as the plain entry list, e.g. `["Arm", "!L"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct BoneFilter {
    prefixes: SmallVec<[String; 4]>,
    exclude_left: bool,
    exclude_right: bool,
}

impl BoneFilter {
    #[must_use]
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::default();
        for entry in entries {
            let entry = entry.into();
            match entry.as_str() {
                EXCLUDE_LEFT => filter.exclude_left = true,
                EXCLUDE_RIGHT => filter.exclude_right = true,
                _ => filter.prefixes.push(entry),
            }
        }
        filter
    }

    /// True when the filter has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && !self.exclude_left && !self.exclude_right
    }

    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    #[must_use]
    pub fn excludes_left(&self) -> bool {
        self.exclude_left
    }

    #[must_use]
    pub fn excludes_right(&self) -> bool {
        self.exclude_right
    }

    /// The entry list this filter was built from (markers last).
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.prefixes.to_vec();
        if self.exclude_left {
            entries.push(EXCLUDE_LEFT.to_string());
        }
        if self.exclude_right {
            entries.push(EXCLUDE_RIGHT.to_string());
        }
        entries
    }

    #[must_use]
    pub fn allows(&self, bone: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.exclude_left && bone.ends_with(LEFT_SUFFIX) {
            return false;
        }
        if self.exclude_right && bone.ends_with(RIGHT_SUFFIX) {
            return false;
        }
        self.prefixes.iter().any(|prefix| bone.starts_with(prefix.as_str()))
    }
}

impl From<Vec<String>> for BoneFilter {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

impl From<BoneFilter> for Vec<String> {
    fn from(filter: BoneFilter) -> Self {
        filter.entries()
    }
}

/// Swaps a trailing `_L` for `_R` and vice versa; other names are unchanged.
#[must_use]
pub fn mirror_bone_name(bone: &str) -> String {
    if let Some(stem) = bone.strip_suffix(LEFT_SUFFIX) {
        format!("{stem}{RIGHT_SUFFIX}")
    } else if let Some(stem) = bone.strip_suffix(RIGHT_SUFFIX) {
        format!("{stem}{LEFT_SUFFIX}")
    } else {
        bone.to_string()
    }
}

/// Reflects a rotation across the sagittal plane by negating X and W.
#[inline]
#[must_use]
pub fn mirror_rotation(rotation: Quat) -> Quat {
    Quat::from_xyzw(-rotation.x, rotation.y, rotation.z, -rotation.w)
}
