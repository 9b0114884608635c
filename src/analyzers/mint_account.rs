// src/analyzers/mint_account.rs
// SPL token mint account, first 82 bytes (Token-2022 mints share them):
//   0..4   mint authority COption tag
//   4..36  mint authority pubkey
//   36..44 supply (u64 LE)
//   44     decimals
//   45     is_initialized
//   46..50 freeze authority COption tag
//   50..82 freeze authority pubkey

use crate::error::{SniperError, SniperResult};

pub const MINT_LEN: usize = 82;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintState {
    pub mint_authority: Option<String>,
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<String>,
}

pub fn parse_mint(data: &[u8]) -> SniperResult<MintState> {
    if data.len() < MINT_LEN {
        return Err(SniperError::malformed(
            "mint",
            format!("expected {} bytes, got {}", MINT_LEN, data.len()),
        ));
    }

    let mut supply = [0u8; 8];
    supply.copy_from_slice(&data[36..44]);

    Ok(MintState {
        mint_authority: optional_pubkey(&data[0..4], &data[4..36])?,
        supply: u64::from_le_bytes(supply),
        decimals: data[44],
        is_initialized: data[45] != 0,
        freeze_authority: optional_pubkey(&data[46..50], &data[50..82])?,
    })
}

fn optional_pubkey(tag: &[u8], key: &[u8]) -> SniperResult<Option<String>> {
    match tag {
        [0, 0, 0, 0] => Ok(None),
        [1, 0, 0, 0] => Ok(Some(bs58::encode(key).into_string())),
        other => Err(SniperError::malformed(
            "mint",
            format!("bad COption tag {:?}", other),
        )),
    }
}

#[cfg(test)]
pub(crate) fn encode_mint(
    mint_authority: Option<[u8; 32]>,
    supply: u64,
    decimals: u8,
    freeze_authority: Option<[u8; 32]>,
) -> Vec<u8> {
    let mut data = vec![0u8; MINT_LEN];
    if let Some(key) = mint_authority {
        data[0] = 1;
        data[4..36].copy_from_slice(&key);
    }
    data[36..44].copy_from_slice(&supply.to_le_bytes());
    data[44] = decimals;
    data[45] = 1;
    if let Some(key) = freeze_authority {
        data[46] = 1;
        data[50..82].copy_from_slice(&key);
    }
    data
}
