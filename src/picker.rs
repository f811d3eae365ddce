use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geocoding::ReverseAddress;
use crate::models::{Address, Coordinates};

pub const PICKER_ZOOM: f64 = 15.0;

/// What the map view should do after the marker moved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewTransition {
    FlyTo { center: Coordinates, zoom: f64 },
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum Interaction {
    DragEnd(Coordinates),
    Click(Coordinates),
}

impl Interaction {
    pub fn coordinates(&self) -> Coordinates {
        match self {
            Interaction::DragEnd(at) | Interaction::Click(at) => *at,
        }
    }
}

/// Single movable marker bound to a coordinate pair.
#[derive(Debug, Clone, Default)]
pub struct LocationPicker {
    position: Option<Coordinates>,
}

impl LocationPicker {
    pub fn new(initial: Option<Coordinates>) -> Self {
        Self {
            position: initial.filter(|at| !at.is_unset()),
        }
    }

    pub fn position(&self) -> Option<Coordinates> {
        self.position
    }

    /// Coordinates pushed in from outside, e.g. a geocoding result.
    /// A 0/0 pair means "unset" and must not animate the view.
    pub fn set_programmatic(&mut self, at: Coordinates) -> ViewTransition {
        if at.is_unset() {
            self.position = None;
            return ViewTransition::Stay;
        }
        self.position = Some(at);
        ViewTransition::FlyTo {
            center: at,
            zoom: PICKER_ZOOM,
        }
    }

    /// Drag end or click. The new coordinate is reported back to the form;
    /// the view already shows it so no transition is needed.
    pub fn handle_interaction(&mut self, interaction: Interaction) -> Coordinates {
        let at = interaction.coordinates();
        debug!(lat = at.latitude, lng = at.longitude, "picker moved by user");
        self.position = Some(at);
        at
    }
}

/// Copies every level the reverse lookup found into the form's address.
pub fn apply_reverse(address: &mut Address, found: &ReverseAddress) {
    let pairs = [
        (&mut address.address, &found.address),
        (&mut address.city, &found.city),
        (&mut address.state, &found.state),
        (&mut address.country, &found.country),
        (&mut address.locality, &found.locality),
    ];
    for (slot, value) in pairs {
        if let Some(value) = value {
            *slot = value.clone();
        }
    }
}
