use crate::core::constants::{
    FEET_PER_METER, MILES_PER_KM, NICE_SCALE_DISTANCES, SQ_FEET_PER_SQ_METER, SQ_MILES_PER_SQ_KM,
};

/// Formats a distance given in kilometers.
///
/// Below one kilometer the value is shown in whole meters, otherwise in
/// kilometers with two decimals. With `dual_units` the imperial equivalent
/// (feet or miles) follows in parentheses.
pub fn format_distance(km: f64, dual_units: bool) -> String {
    if km.abs() < 1.0 {
        let meters = km * 1000.0;
        let text = format!("{:.0} m", meters);
        if dual_units {
            format!("{} ({:.0} ft)", text, meters * FEET_PER_METER)
        } else {
            text
        }
    } else {
        let text = format!("{:.2} km", km);
        if dual_units {
            format!("{} ({:.2} mi)", text, km * MILES_PER_KM)
        } else {
            text
        }
    }
}

/// Formats an area given in square kilometers
pub fn format_area(km2: f64, dual_units: bool) -> String {
    if km2.abs() < 1.0 {
        let square_meters = km2 * 1_000_000.0;
        let text = format!("{:.0} m²", square_meters);
        if dual_units {
            format!("{} ({:.0} ft²)", text, square_meters * SQ_FEET_PER_SQ_METER)
        } else {
            text
        }
    } else {
        let text = format!("{:.2} km²", km2);
        if dual_units {
            format!("{} ({:.2} mi²)", text, km2 * SQ_MILES_PER_SQ_KM)
        } else {
            text
        }
    }
}

/// Largest ladder value not exceeding `target_km`; the smallest rung when the
/// target is below the ladder
pub fn get_nice_scale_distance(target_km: f64) -> f64 {
    NICE_SCALE_DISTANCES
        .iter()
        .copied()
        .take_while(|&d| d <= target_km)
        .last()
        .unwrap_or(NICE_SCALE_DISTANCES[0])
}

/// Short label for a ladder distance: "500 m", "5 km"
pub fn format_scale_label(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round())
    } else {
        format!("{} km", km)
    }
}
