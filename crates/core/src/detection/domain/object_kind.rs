use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! object_kinds {
    ($($variant:ident => $label:literal),+ $(,)?) => {
        /// Categories the detector can report (COCO classes plus `Undefined`).
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ObjectKind {
            $($variant),+
        }

        impl ObjectKind {
            /// Every kind, in declaration order, including `Undefined`.
            pub const ALL: &'static [ObjectKind] = &[$(ObjectKind::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $(ObjectKind::$variant => $label),+
                }
            }
        }
    };
}

object_kinds! {
    Undefined => "undefined",
    Person => "person",
    Bicycle => "bicycle",
    Car => "car",
    Motorbike => "motorbike",
    Aeroplane => "aeroplane",
    Bus => "bus",
    Train => "train",
    Truck => "truck",
    Boat => "boat",
    TrafficLight => "traffic_light",
    FireHydrant => "fire_hydrant",
    StopSign => "stop_sign",
    ParkingMeter => "parking_meter",
    Bench => "bench",
    Bird => "bird",
    Cat => "cat",
    Dog => "dog",
    Horse => "horse",
    Sheep => "sheep",
    Cow => "cow",
    Elephant => "elephant",
    Bear => "bear",
    Zebra => "zebra",
    Giraffe => "giraffe",
    Backpack => "backpack",
    Umbrella => "umbrella",
    Handbag => "handbag",
    Tie => "tie",
    Suitcase => "suitcase",
    Frisbee => "frisbee",
    Skis => "skis",
    Snowboard => "snowboard",
    SportsBall => "sports_ball",
    Kite => "kite",
    BaseballBat => "baseball_bat",
    BaseballGlove => "baseball_glove",
    Skateboard => "skateboard",
    Surfboard => "surfboard",
    TennisRacket => "tennis_racket",
    Bottle => "bottle",
    WineGlass => "wine_glass",
    Cup => "cup",
    Fork => "fork",
    Knife => "knife",
    Spoon => "spoon",
    Bowl => "bowl",
    Banana => "banana",
    Apple => "apple",
    Sandwich => "sandwich",
    Orange => "orange",
    Broccoli => "broccoli",
    Carrot => "carrot",
    HotDog => "hot_dog",
    Pizza => "pizza",
    Donut => "donut",
    Cake => "cake",
    Chair => "chair",
    Couch => "couch",
    PottedPlant => "potted_plant",
    Bed => "bed",
    DiningTable => "dining_table",
    Toilet => "toilet",
    Tv => "tv",
    Laptop => "laptop",
    Mouse => "mouse",
    Remote => "remote",
    Keyboard => "keyboard",
    CellPhone => "cell_phone",
    Microwave => "microwave",
    Oven => "oven",
    Toaster => "toaster",
    Sink => "sink",
    Refrigerator => "refrigerator",
    Book => "book",
    Clock => "clock",
    Vase => "vase",
    Scissors => "scissors",
    TeddyBear => "teddy_bear",
    HairDryer => "hair_dryer",
    Toothbrush => "toothbrush",
}

impl ObjectKind {
    /// Kinds offered for filtering. `Undefined` is never reported by the
    /// detector, so it is not selectable.
    pub fn selectable() -> impl Iterator<Item = ObjectKind> {
        Self::ALL
            .iter()
            .copied()
            .filter(|kind| *kind != ObjectKind::Undefined)
    }

    pub fn selectable_count() -> usize {
        Self::ALL.len() - 1
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    /// Accepts labels case-insensitively, with `-` or spaces in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| format!("unknown object kind '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_all_has_80_classes_plus_undefined() {
        assert_eq!(ObjectKind::ALL.len(), 81);
        assert_eq!(ObjectKind::ALL[0], ObjectKind::Undefined);
    }

    #[test]
    fn test_selectable_excludes_undefined() {
        let selectable: Vec<_> = ObjectKind::selectable().collect();
        assert_eq!(selectable.len(), ObjectKind::selectable_count());
        assert!(!selectable.contains(&ObjectKind::Undefined));
        assert_eq!(selectable[0], ObjectKind::Person);
    }

    #[rstest]
    #[case::plain("person", ObjectKind::Person)]
    #[case::uppercase("CAR", ObjectKind::Car)]
    #[case::dashed("traffic-light", ObjectKind::TrafficLight)]
    #[case::spaced(" teddy bear ", ObjectKind::TeddyBear)]
    fn test_parse_labels(#[case] input: &str, #[case] expected: ObjectKind) {
        assert_eq!(input.parse::<ObjectKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_label_errors() {
        assert!("spaceship".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = ObjectKind::ALL.iter().map(|k| k.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), ObjectKind::ALL.len());
    }

    #[test]
    fn test_serde_uses_snake_case_labels() {
        let json = serde_json::to_string(&ObjectKind::DiningTable).unwrap();
        assert_eq!(json, "\"dining_table\"");
        let kind: ObjectKind = serde_json::from_str("\"cell_phone\"").unwrap();
        assert_eq!(kind, ObjectKind::CellPhone);
    }
}
