//! Internal unit system.
//!
//! Energies are stored in MeV, times in nanoseconds and lengths in
//! millimetres. Multiply by a constant to convert into internal units and
//! divide by it to convert back, e.g. `edep / KEV` gives keV.

/// One mega-electronvolt (the internal energy unit).
pub const MEV: f64 = 1.0;
/// One kilo-electronvolt.
pub const KEV: f64 = 1.0e-3 * MEV;

/// One nanosecond (the internal time unit).
pub const NS: f64 = 1.0;
/// One microsecond.
pub const MICROSECOND: f64 = 1.0e3 * NS;

/// One millimetre (the internal length unit).
pub const MM: f64 = 1.0;
