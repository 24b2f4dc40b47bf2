use bitflags::bitflags;

use crate::error::{BridgeError, Result};

/// Lifecycle of the GPU binding.
/// - `Unbound --bind--> Bound --unbind--> Unbound`
/// - Reset of the frame buffer is only possible while `Unbound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum BindState {
    #[default]
    Unbound,
    Bound,
}

impl BindState {
    pub fn is_bound(self) -> bool {
        self == BindState::Bound
    }

    pub fn bind(&mut self) -> Result<()> {
        match self {
            BindState::Unbound => { *self = BindState::Bound; Ok(()) },
            BindState::Bound   => Err(BridgeError::AlreadyBound),
        }
    }

    pub fn unbind(&mut self) -> Result<()> {
        match self {
            BindState::Bound   => { *self = BindState::Unbound; Ok(()) },
            BindState::Unbound => Err(BridgeError::NotBound),
        }
    }

    pub fn ensure_bound(self) -> Result<()> {
        if self.is_bound() { Ok(()) } else { Err(BridgeError::NotBound) }
    }

    pub fn ensure_resettable(self) -> Result<()> {
        if self.is_bound() { Err(BridgeError::ResetWhileBound) } else { Ok(()) }
    }
}

bitflags! {
    /// Parts of the host state which changed since the last bind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dirty: u32 {
        const CAMERA   = 1 << 0;
        const FILM     = 1 << 1;
        const SETTINGS = 1 << 2;
        const LIGHTING = 1 << 3;
    }
}

impl Dirty {
    /// Any change of what the kernel sees invalidates the accumulated estimate.
    pub fn restarts_accumulation(self) -> bool {
        !self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_unbind_round_trip() {
        let mut state = BindState::default();
        assert_eq!(state, BindState::Unbound);
        state.bind().unwrap();
        assert!(state.is_bound());
        state.unbind().unwrap();
        assert_eq!(state, BindState::Unbound);
    }

    #[test]
    fn double_bind_is_rejected_and_keeps_state() {
        let mut state = BindState::Bound;
        assert!(matches!(state.bind(), Err(BridgeError::AlreadyBound)));
        assert!(state.is_bound());
    }

    #[test]
    fn unbind_without_bind_is_rejected() {
        let mut state = BindState::Unbound;
        assert!(matches!(state.unbind(), Err(BridgeError::NotBound)));
        assert!(matches!(state.ensure_bound(), Err(BridgeError::NotBound)));
    }

    #[test]
    fn reset_only_while_unbound() {
        assert!(BindState::Unbound.ensure_resettable().is_ok());
        assert!(matches!(BindState::Bound.ensure_resettable(), Err(BridgeError::ResetWhileBound)));
    }

    #[test]
    fn display_names_states() {
        assert_eq!(BindState::Bound.to_string(), "Bound");
    }

    #[test]
    fn clean_state_keeps_accumulation() {
        assert!(!Dirty::empty().restarts_accumulation());
        assert!((Dirty::CAMERA | Dirty::LIGHTING).restarts_accumulation());
    }
}
