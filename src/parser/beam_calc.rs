// ==========================================
// Cut-List Import Pipeline - beam quantity conversion
// ==========================================
// The cutting system reports material usage as a beam count plus a
// remainder in millimetres on the last beam. The warehouse counts whole
// beams and a partial length in metres, so the remainder is folded back:
// the last beam is only counted as partial when at least one full
// rounding step (1 m) of it is left over.
// ==========================================

/// Length of one stock beam in millimetres.
pub const BEAM_LENGTH_MM: u32 = 6_000;

/// Remainders are rounded DOWN to this step before conversion.
pub const REST_ROUNDING_MM: u32 = 1_000;

/// Result of the conversion: whole beams plus a partial length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamQuantity {
    pub beams: u32,
    pub meters: f64,
}

/// Round a remainder down to the nearest full rounding step.
pub fn round_rest(rest_mm: u32) -> u32 {
    (rest_mm / REST_ROUNDING_MM) * REST_ROUNDING_MM
}

/// Convert (raw beam count, remainder on the last beam) into the
/// warehouse representation.
///
/// Total for every non-negative input pair: remainders beyond the beam
/// length are clamped and a beam count of zero saturates instead of
/// underflowing. Out-of-range inputs are logged, not rejected - a bad
/// row must never abort the surrounding file.
pub fn calculate_beams_and_meters(raw_beams: u32, rest_mm: u32) -> BeamQuantity {
    let mut rounded = round_rest(rest_mm);

    if rounded == 0 {
        // Less than one rounding step left over: the last beam counts
        // as fully used.
        return BeamQuantity {
            beams: raw_beams,
            meters: 0.0,
        };
    }

    if rounded > BEAM_LENGTH_MM {
        tracing::warn!(
            rest_mm,
            beam_length_mm = BEAM_LENGTH_MM,
            "remainder exceeds beam length, clamping"
        );
        rounded = BEAM_LENGTH_MM;
    }

    if raw_beams == 0 {
        tracing::warn!(rest_mm, "remainder reported without any beams, ignoring");
        return BeamQuantity {
            beams: 0,
            meters: 0.0,
        };
    }

    BeamQuantity {
        beams: raw_beams - 1,
        meters: f64::from(BEAM_LENGTH_MM - rounded) / 1_000.0,
    }
}
