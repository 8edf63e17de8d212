//! Runtime configuration of a party
//!
//! The compile-time parameterization of a fixed build — moduli, ring
//! degree, party sets, self id — becomes one validated runtime value
//! handed to every component constructor.

use lattice_he::BgvParams;

use crate::{error::CoreError, network::Communicator, PartyId};

/// Everything a party needs to know at startup
#[derive(Clone, Debug)]
pub struct MpcConfig {
    /// The cryptosystem parameters
    pub params: BgvParams,
    /// The fixed quorum of compute parties
    pub compute_parties: Communicator,
    /// The parties contributing private inputs
    pub input_parties: Communicator,
    /// The id of the local party
    pub self_id: PartyId,
}

impl MpcConfig {
    /// Validate party-set compatibility
    ///
    /// The cryptosystem parameters were already validated when
    /// [`BgvParams`] was constructed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.compute_parties.is_empty() {
            return Err(CoreError::ConfigInvalid("compute quorum is empty".into()));
        }
        for &p in self.compute_parties.parties() {
            if self.input_parties.contains(p) {
                return Err(CoreError::ConfigInvalid(format!(
                    "party {p} is both a compute and an input party"
                )));
            }
        }
        if !self.compute_parties.contains(self.self_id)
            && !self.input_parties.contains(self.self_id)
        {
            return Err(CoreError::ConfigInvalid(format!(
                "self id {} is in neither party set",
                self.self_id
            )));
        }
        Ok(())
    }

    /// All parties: the compute quorum followed by the input parties
    pub fn all_parties(&self) -> Communicator {
        self.compute_parties.append(&self.input_parties)
    }

    /// Whether the local party computes
    pub fn is_compute(&self) -> bool {
        self.compute_parties.contains(self.self_id)
    }

    /// Whether the local party contributes input
    pub fn is_input(&self) -> bool {
        self.input_parties.contains(self.self_id)
    }

    /// The local party's position in the compute quorum
    pub fn compute_index(&self) -> Option<usize> {
        self.compute_parties.index_of(self.self_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_params() -> BgvParams {
        BgvParams::new(998244353, 17, 4, 1 << 18, 4, 8, 2, 2).unwrap()
    }

    #[test]
    fn test_validate_overlapping_sets() {
        let cfg = MpcConfig {
            params: toy_params(),
            compute_parties: Communicator::new(vec![0, 1]),
            input_parties: Communicator::new(vec![1, 2]),
            self_id: 0,
        };
        assert!(matches!(cfg.validate(), Err(CoreError::ConfigInvalid(_))));
    }

    #[test]
    fn test_validate_unknown_self() {
        let cfg = MpcConfig {
            params: toy_params(),
            compute_parties: Communicator::new(vec![0, 1]),
            input_parties: Communicator::new(vec![2]),
            self_id: 9,
        };
        assert!(matches!(cfg.validate(), Err(CoreError::ConfigInvalid(_))));
    }

    #[test]
    fn test_roles() {
        let cfg = MpcConfig {
            params: toy_params(),
            compute_parties: Communicator::new(vec![0, 1]),
            input_parties: Communicator::new(vec![2]),
            self_id: 2,
        };
        cfg.validate().unwrap();
        assert!(cfg.is_input());
        assert!(!cfg.is_compute());
        assert_eq!(cfg.all_parties().parties(), &[0, 1, 2]);
    }
}
