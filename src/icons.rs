//! Pace-note icon catalog used to tag waypoints.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub name: &'static str,
    pub src: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IconCategory {
    pub name: &'static str,
    pub icons: &'static [Icon],
}

const fn icon(name: &'static str, src: &'static str) -> Icon {
    Icon { name, src }
}

pub const CATEGORIES: &[IconCategory] = &[
    IconCategory {
        name: "Abbreviations",
        icons: &[
            icon("Keep to the left", "/icons/keep-left.svg"),
            icon("Keep to the right", "/icons/keep-right.svg"),
            icon("Keep straight", "/icons/keep-straight.svg"),
            icon("Left", "/icons/left.svg"),
            icon("Right", "/icons/right.svg"),
            icon("On Left", "/icons/on-left.svg"),
            icon("On Right", "/icons/on-right.svg"),
            icon("Bad", "/icons/bad.svg"),
        ],
    },
    IconCategory {
        name: "On Track",
        icons: &[
            icon("Bump", "/icons/bump.svg"),
            icon("Bumpy", "/icons/bumpy.svg"),
            icon("Dip Hole", "/icons/dip-hole.svg"),
            icon("Ditch", "/icons/ditch.svg"),
            icon("Summit", "/icons/summit.svg"),
            icon("Hole", "/icons/hole.svg"),
            icon("Up hill", "/icons/uphill.svg"),
            icon("Down hill", "/icons/downhill.svg"),
            icon("Fence gate", "/icons/fence-gate.svg"),
            icon("Water crossing", "/icons/wading.svg"),
            icon("Grid", "/icons/grid.svg"),
            icon("Fence", "/icons/fence.svg"),
            icon("Rail road", "/icons/railroad.svg"),
            icon("Twisty", "/icons/twisty.svg"),
            icon("Tree", "/icons/tree_5.svg"),
            icon("Petrol Station", "/icons/petrol_station.svg"),
        ],
    },
    IconCategory {
        name: "Controls",
        icons: &[
            icon("Stop for Restart", "/icons/stop_for_restart.svg"),
            icon(
                "Arrive Selective Section",
                "/icons/arrive_selective_section_flag.svg",
            ),
        ],
    },
    IconCategory {
        name: "Safety",
        icons: &[
            icon("Danger 1", "/icons/danger-1.svg"),
            icon("Danger 2", "/icons/danger-2.svg"),
            icon("Danger 3", "/icons/danger-3.svg"),
            icon("Stop", "/icons/stop.svg"),
            icon("Caution", "/icons/caution.svg"),
        ],
    },
];

pub fn all_icons() -> impl Iterator<Item = &'static Icon> {
    CATEGORIES.iter().flat_map(|c| c.icons.iter())
}

/// Find an icon by its exact name.
pub fn find(name: &str) -> Option<&'static Icon> {
    all_icons().find(|i| i.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_icon() {
        let i = find("Water crossing").unwrap();
        assert_eq!(i.src, "/icons/wading.svg");
    }

    #[test]
    fn test_find_is_case_sensitive() {
        assert!(find("water crossing").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = all_icons().map(|i| i.name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
