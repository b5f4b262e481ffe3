use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Height-indexed network parameters
///
/// A milestone stays active from its height until the next milestone's
/// height. Lookups always resolve to the last milestone at or below the
/// queried height.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub height: u64,
    /// Forging reward in satoshis
    pub reward: u64,
    pub block_version: u32,
    pub max_transactions: usize,
    /// Upper bound on the summed serialized size of a block's payload
    pub max_payload: usize,
    /// Upper bound on the header's declared payload length
    pub max_payload_length: usize,
    /// Historical leniency: accept a second-signature field on
    /// transactions from wallets that have none registered
    pub ignore_invalid_second_signature_field: bool,
}

/// Static fee schedule, keyed by transaction type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub transfer: u64,
    pub second_signature: u64,
    pub delegate_registration: u64,
    pub vote: u64,
    /// Base fee per multisignature participant
    pub multi_signature: u64,
    pub ipfs: u64,
    pub timelock_transfer: u64,
    pub multi_payment: u64,
    pub delegate_resignation: u64,
}

/// Frozen historical correction tables
///
/// Both tables correct ids that were computed under since-fixed bugs and
/// must be preserved verbatim for chain continuity. They are loaded once
/// with the network preset and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Exceptions {
    /// Broken type 1 and 4 transaction ids, erroneously calculated with
    /// a recipient id: computed id -> historical id
    pub transaction_id_fix_table: HashMap<String, String>,
    /// Block ids recorded under the v1 outlook bug: computed id ->
    /// historical id
    pub outlook_table: HashMap<String, String>,
    /// Further block id corrections, applied after the outlook table
    pub block_id_fix_table: HashMap<String, String>,
}

impl Exceptions {
    /// Substitute a computed transaction id through the fix table
    pub fn fix_transaction_id(&self, id: String) -> String {
        match self.transaction_id_fix_table.get(&id) {
            Some(fixed) => fixed.clone(),
            None => id,
        }
    }

    /// True if this id is one of the historically broken transactions,
    /// whose signing payload must keep its erroneous recipient bytes
    pub fn is_broken_transaction_id(&self, id: &str) -> bool {
        self.transaction_id_fix_table
            .values()
            .any(|fixed| fixed == id)
    }

    /// Substitute a computed block id, outlook table first
    pub fn fix_block_id(&self, id: String) -> String {
        let id = match self.outlook_table.get(&id) {
            Some(fixed) => fixed.clone(),
            None => id,
        };
        match self.block_id_fix_table.get(&id) {
            Some(fixed) => fixed.clone(),
            None => id,
        }
    }
}

/// Immutable network configuration context
///
/// One of these exists per node process. It is passed by reference into
/// the codec, handlers, builders and verifier rather than living in
/// global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    /// Network epoch as unix seconds; all timestamps count from here
    pub epoch: u64,
    pub blocktime: u32,
    /// Address version byte, also the default transaction network byte
    pub pub_key_hash: u8,
    /// WIF version byte
    pub wif: u8,
    pub milestones: Vec<Milestone>,
    pub fees: FeeSchedule,
    pub exceptions: Exceptions,
}

impl NetworkConfig {
    /// The milestone active at `height`
    ///
    /// Milestones are sorted ascending by height; the first one must
    /// cover height 1.
    pub fn milestone(&self, height: u64) -> &Milestone {
        let mut active = &self.milestones[0];
        for milestone in &self.milestones {
            if milestone.height > height {
                break;
            }
            active = milestone;
        }
        active
    }

    pub fn mainnet() -> NetworkConfig {
        NetworkConfig {
            name: "mainnet".to_string(),
            epoch: 1_490_101_200, // 2017-03-21T13:00:00Z
            blocktime: 8,
            pub_key_hash: 0x17,
            wif: 170,
            milestones: vec![
                Milestone {
                    height: 1,
                    reward: 0,
                    block_version: 0,
                    max_transactions: 50,
                    max_payload: 2_097_152,
                    max_payload_length: 2_097_152,
                    ignore_invalid_second_signature_field: true,
                },
                Milestone {
                    height: 75_600,
                    reward: 200_000_000,
                    block_version: 0,
                    max_transactions: 50,
                    max_payload: 2_097_152,
                    max_payload_length: 2_097_152,
                    ignore_invalid_second_signature_field: true,
                },
                Milestone {
                    height: 6_600_000,
                    reward: 200_000_000,
                    block_version: 0,
                    max_transactions: 150,
                    max_payload: 2_097_152,
                    max_payload_length: 2_097_152,
                    ignore_invalid_second_signature_field: false,
                },
            ],
            fees: FeeSchedule {
                transfer: 10_000_000,
                second_signature: 500_000_000,
                delegate_registration: 2_500_000_000,
                vote: 100_000_000,
                multi_signature: 500_000_000,
                ipfs: 0,
                timelock_transfer: 0,
                multi_payment: 0,
                delegate_resignation: 0,
            },
            exceptions: Exceptions {
                outlook_table: MAINNET_OUTLOOK_TABLE.clone(),
                ..Exceptions::default()
            },
        }
    }

    pub fn devnet() -> NetworkConfig {
        NetworkConfig {
            name: "devnet".to_string(),
            epoch: 1_490_101_200,
            blocktime: 8,
            pub_key_hash: 0x1e,
            wif: 170,
            milestones: vec![Milestone {
                height: 1,
                reward: 200_000_000,
                block_version: 0,
                max_transactions: 50,
                max_payload: 2_097_152,
                max_payload_length: 2_097_152,
                ignore_invalid_second_signature_field: false,
            }],
            fees: FeeSchedule {
                transfer: 10_000_000,
                second_signature: 500_000_000,
                delegate_registration: 2_500_000_000,
                vote: 100_000_000,
                multi_signature: 500_000_000,
                ipfs: 0,
                timelock_transfer: 0,
                multi_payment: 0,
                delegate_resignation: 0,
            },
            exceptions: Exceptions::default(),
        }
    }
}

/// Mainnet block ids recorded before the v1 outlook fix, reproduced
/// verbatim: recomputing these blocks yields the left-hand id, the chain
/// stores the right-hand one.
static MAINNET_OUTLOOK_TABLE: Lazy<HashMap<String, String>> = Lazy::new(|| {
    [
        ("5139199631254983076", "1000099631254983076"),
        ("4683900276587456793", "1000000276587456793"),
        ("4719273207090574361", "1000073207090574361"),
        ("10008425497949974873", "10000425497949974873"),
        ("3011426208694781338", "1000026208694781338"),
        ("122506651077645039", "100006651077645039"),
        ("5720847785115142568", "1000047785115142568"),
        ("7018402152859193732", "1000002152859193732"),
        ("12530635932931954947", "10000635932931954947"),
        ("7061061305098280027", "1000061305098280027"),
        ("3983271186026110297", "1000071186026110297"),
        ("3546732630357730082", "1000032630357730082"),
        ("14024378732446299587", "10000378732446299587"),
        ("5160516564770509401", "1000016564770509401"),
        ("241883250703033792", "100003250703033792"),
        ("18238049267092652511", "10000049267092652511"),
        ("3824223895435898486", "1000023895435898486"),
        ("4888561739037785996", "1000061739037785996"),
        ("1256478353465481084", "1000078353465481084"),
        ("12598210368652133913", "10000210368652133913"),
        ("17559226088420912749", "10000226088420912749"),
        ("13894975866600060289", "10000975866600060289"),
        ("11710672157782824154", "10000672157782824154"),
        ("5509880884401609373", "1000080884401609373"),
        ("11486353335769396593", "10000353335769396593"),
        ("10147280738049458646", "10000280738049458646"),
        ("5684621525438367021", "1000021525438367021"),
        ("719490120693255848", "100000120693255848"),
        ("7154018532147250826", "1000018532147250826"),
        ("38016207884795383", "10000207884795383"),
        ("8324387831264270399", "1000087831264270399"),
        ("10123661368384267251", "10000661368384267251"),
        ("2222163236406460530", "1000063236406460530"),
        ("5059382813585250340", "1000082813585250340"),
        ("7091362542116598855", "1000062542116598855"),
        ("8225244493039935740", "1000044493039935740"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
});
