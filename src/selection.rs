use crate::models::Availability;

/// Base likelihood (out of 100) before scaling by recent appearances.
pub fn base_likelihood(availability: Availability, early_sub: bool) -> u8 {
    match (availability, early_sub) {
        (Availability::Injured | Availability::Suspended, _) => 0,
        (Availability::Doubtful, true) => 50,
        (Availability::Doubtful, false) => 67,
        (Availability::Available | Availability::Other, true) => 80,
        (Availability::Available | Availability::Other, false) => 95,
    }
}

/// `floor(base × games_played_factor)`, always within 0..=95.
pub fn selection_likelihood(
    availability: Availability,
    early_sub: bool,
    games_played_factor: f64,
) -> u8 {
    let base = f64::from(base_likelihood(availability, early_sub));
    let factor = if games_played_factor.is_finite() {
        games_played_factor.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (base * factor).floor() as u8
}
