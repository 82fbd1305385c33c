use lampsync_common::Device;

/// Picks the highest-id device of `device_type`; on equal ids the later entry wins.
///
/// Only sees the page it is given. If the registry holds more devices than one
/// page, or does not order by id, the true newest device can be missed.
pub fn select_target<'a>(devices: &'a [Device], device_type: &str) -> Option<&'a Device> {
    devices
        .iter()
        .filter(|d| d.is_type(device_type))
        .max_by_key(|d| d.id)
}
