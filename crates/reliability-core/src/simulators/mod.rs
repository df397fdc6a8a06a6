//! The three interchangeable sampling strategies: direct simulation
//! (likelihood ratio always 1), balanced failure biasing, and uniformized
//! balanced failure biasing.

pub mod bfb;
pub mod direct;
pub mod uniform_bfb;

pub use bfb::BfbSimulator;
pub use direct::DirectSimulator;
pub use uniform_bfb::UniformBfbSimulator;

pub(crate) fn update_all_clocks(components: &mut [crate::component::Component], t: f64) {
    for c in components.iter_mut() {
        c.update_clock(t);
    }
}
