use eframe::egui::Vec2;

use super::super::physics::Body;

/// Index of the body whose circle (grown by `tolerance`) contains `point`,
/// nearest centre first. Equal distances keep the earlier body.
pub(in crate::app) fn nearest_containing(
    bodies: &[Body],
    point: Vec2,
    tolerance: f32,
) -> Option<usize> {
    bodies
        .iter()
        .enumerate()
        .filter_map(|(index, body)| {
            let distance = (body.position - point).length();
            if distance <= body.current_radius + tolerance {
                Some((index, distance))
            } else {
                None
            }
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _distance)| index)
}
