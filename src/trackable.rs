/// Something whose state is sampled into the histories once per recorded time point.
pub trait Trackable {
    /// Unique name; history keys are `"{display_name}_{field}"`.
    fn display_name(&self) -> &str;

    /// Current value of every tracked field, always in the same order.
    fn current_state(&self) -> Vec<(&'static str, f64)>;
}
