// Round Lottery - Utility Functions
use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::error::LotteryError;

pub const CONFIG_SEED: &[u8] = b"config";
pub const GAME_STATE_SEED: &[u8] = b"game_state";
pub const VAULT_SEED: &[u8] = b"vault";

/// Reduce seed bytes to a value in `[0, max)`.
///
/// Takes up to 16 seed bytes as a little-endian u128, so the modulo bias
/// is below `max / 2^128`.
pub fn generate_random_value(seed: &[u8], max: u64) -> u64 {
    if max == 0 {
        return 0;
    }

    let mut bytes = [0u8; 16];
    let len = std::cmp::min(seed.len(), 16);
    bytes[..len].copy_from_slice(&seed[..len]);

    let random_value = u128::from_le_bytes(bytes);
    (random_value % u128::from(max)) as u64
}

/// Find the program derived address of the config account
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the game state account
pub fn find_game_state_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[GAME_STATE_SEED], program_id)
}

/// Find the program derived address of the vault holding every stake
pub fn find_vault_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED], program_id)
}

/// Check `key` is the PDA for `seed` with the stored `bump`
pub fn verify_program_address(
    key: &Pubkey,
    seed: &[u8],
    bump: u8,
    program_id: &Pubkey,
) -> ProgramResult {
    let expected = Pubkey::create_program_address(&[seed, &[bump]], program_id)
        .map_err(|_| LotteryError::InvalidAccountAddress)?;
    if *key != expected {
        return Err(LotteryError::InvalidAccountAddress.into());
    }
    Ok(())
}

/// Transfer lamports out of the program-owned vault
pub fn transfer_from_vault(vault: &AccountInfo, to: &AccountInfo, amount: u64) -> ProgramResult {
    if amount == 0 {
        return Ok(());
    }
    let vault_lamports = vault
        .lamports()
        .checked_sub(amount)
        .ok_or(LotteryError::InsufficientFunds)?;
    let to_lamports = to
        .lamports()
        .checked_add(amount)
        .ok_or(ProgramError::from(LotteryError::ArithmeticOverflow))?;

    **vault.try_borrow_mut_lamports()? = vault_lamports;
    **to.try_borrow_mut_lamports()? = to_lamports;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_value_stays_below_max() {
        assert_eq!(generate_random_value(&[7, 0, 0, 0, 0, 0, 0, 0], 5), 2);
        assert_eq!(generate_random_value(&[0xff; 32], 1), 0);
        assert_eq!(generate_random_value(&[9], 0), 0);
        // short seeds are zero padded
        assert_eq!(generate_random_value(&[3], 100), 3);
    }

    #[test]
    fn random_value_uses_high_seed_bytes() {
        // 2^64 mod 3 == 1, a u64 reduction would only see the zero low half
        let mut seed = [0u8; 16];
        seed[8] = 1;
        assert_eq!(generate_random_value(&seed, 3), 1);
    }

    #[test]
    fn random_value_reduces_samples_above_u64() {
        // 2^64 = (2^63 + 1) + (2^63 - 1)
        let max = (1u64 << 63) + 1;
        let mut seed = [0u8; 16];
        seed[8] = 1;
        assert_eq!(generate_random_value(&seed, max), (1u64 << 63) - 1);
    }

    #[test]
    fn derived_addresses_verify_with_their_bump() {
        let program_id = Pubkey::new_unique();
        let (vault, bump) = find_vault_address(&program_id);
        assert!(verify_program_address(&vault, VAULT_SEED, bump, &program_id).is_ok());

        let (config, _) = find_config_address(&program_id);
        assert_eq!(
            verify_program_address(&config, VAULT_SEED, bump, &program_id),
            Err(ProgramError::from(LotteryError::InvalidAccountAddress))
        );
    }

    #[test]
    fn vault_transfer_moves_lamports() {
        let owner = Pubkey::new_unique();
        let (vault_key, to_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut vault_lamports, mut to_lamports) = (1_000u64, 5u64);
        let (mut vault_data, mut to_data): ([u8; 0], [u8; 0]) = ([], []);
        let vault = AccountInfo::new(
            &vault_key, false, true, &mut vault_lamports, &mut vault_data, &owner, false, 0,
        );
        let to = AccountInfo::new(
            &to_key, false, true, &mut to_lamports, &mut to_data, &owner, false, 0,
        );

        transfer_from_vault(&vault, &to, 400).unwrap();
        assert_eq!(vault.lamports(), 600);
        assert_eq!(to.lamports(), 405);

        assert_eq!(
            transfer_from_vault(&vault, &to, 601),
            Err(ProgramError::from(LotteryError::InsufficientFunds))
        );
        assert_eq!(vault.lamports(), 600);
    }
}
