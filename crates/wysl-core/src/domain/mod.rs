//! Domain entities for WYSL.
//!
//! Pure game rules with no infrastructure dependencies: everything here can be
//! compiled and tested without a camera, a relay board or a network peer.

/// Game state machine vocabulary.
///
/// See [`game::GameState`] and [`game::SessionEnd`] for the main types.
pub mod game;
