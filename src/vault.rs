// Round Lottery - Lamport custody
use solana_program::{
    account_info::AccountInfo, msg, program::invoke, program_error::ProgramError,
    pubkey::Pubkey, system_instruction,
};

use crate::{error::LotteryError, oracle::Treasury, utils::transfer_from_vault};

/// Treasury backed by the program-owned vault PDA.
///
/// Only moves lamports between the vault and the one player account passed
/// to the instruction. The vault's rent-exempt reserve is never paid out.
pub struct LamportVault<'a, 'b> {
    vault: &'a AccountInfo<'b>,
    player: Option<&'a AccountInfo<'b>>,
    system_program: Option<&'a AccountInfo<'b>>,
    rent_reserve: u64,
}

impl<'a, 'b> LamportVault<'a, 'b> {
    pub fn new(
        vault: &'a AccountInfo<'b>,
        player: &'a AccountInfo<'b>,
        system_program: Option<&'a AccountInfo<'b>>,
        rent_reserve: u64,
    ) -> Self {
        Self {
            vault,
            player: Some(player),
            system_program,
            rent_reserve,
        }
    }

    /// Balance-only view, every transfer fails
    pub fn read_only(vault: &'a AccountInfo<'b>, rent_reserve: u64) -> Self {
        Self {
            vault,
            player: None,
            system_program: None,
            rent_reserve,
        }
    }

    fn counterparty(&self, key: &Pubkey) -> Result<&'a AccountInfo<'b>, ProgramError> {
        match self.player {
            Some(player) if player.key == key => Ok(player),
            _ => {
                msg!("Transfer counterparty {} was not passed to the instruction", key);
                Err(ProgramError::InvalidArgument)
            }
        }
    }
}

impl<'a, 'b> Treasury for LamportVault<'a, 'b> {
    fn withdraw(&mut self, from: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        let player = self.counterparty(from)?;
        if !player.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if player.lamports() < amount {
            msg!(
                "Insufficient funds: needed {} lamports, had {} lamports",
                amount,
                player.lamports()
            );
            return Err(LotteryError::InsufficientFunds.into());
        }
        let system_program = self.system_program.ok_or(ProgramError::NotEnoughAccountKeys)?;

        invoke(
            &system_instruction::transfer(player.key, self.vault.key, amount),
            &[
                player.clone(),
                self.vault.clone(),
                system_program.clone(),
            ],
        )?;
        msg!("Transferred {} lamports into vault {}", amount, self.vault.key);
        Ok(())
    }

    fn deposit(&mut self, to: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        let player = self.counterparty(to)?;
        if self.balance() < amount {
            msg!("Vault holds {} lamports, cannot pay {}", self.balance(), amount);
            return Err(LotteryError::InsufficientFunds.into());
        }
        transfer_from_vault(self.vault, player, amount)
    }

    fn balance(&self) -> u64 {
        self.vault.lamports().saturating_sub(self.rent_reserve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pays_out_above_rent_reserve_only() {
        let program_id = Pubkey::new_unique();
        let (vault_key, player_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut vault_lamports, mut player_lamports) = (1_500u64, 0u64);
        let (mut vault_data, mut player_data): ([u8; 0], [u8; 0]) = ([], []);
        let vault = AccountInfo::new(
            &vault_key, false, true, &mut vault_lamports, &mut vault_data, &program_id, false, 0,
        );
        let player = AccountInfo::new(
            &player_key, true, true, &mut player_lamports, &mut player_data, &program_id, false, 0,
        );
        let mut treasury = LamportVault::new(&vault, &player, None, 1_000);

        assert_eq!(treasury.balance(), 500);
        assert_eq!(
            treasury.deposit(&player_key, 501),
            Err(ProgramError::from(LotteryError::InsufficientFunds))
        );

        treasury.deposit(&player_key, 500).unwrap();
        assert_eq!(treasury.balance(), 0);
        assert_eq!(player.lamports(), 500);
        assert_eq!(vault.lamports(), 1_000);
    }

    #[test]
    fn rejects_unknown_counterparty_and_poor_players() {
        let program_id = Pubkey::new_unique();
        let (vault_key, player_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut vault_lamports, mut player_lamports) = (1_000u64, 10u64);
        let (mut vault_data, mut player_data): ([u8; 0], [u8; 0]) = ([], []);
        let vault = AccountInfo::new(
            &vault_key, false, true, &mut vault_lamports, &mut vault_data, &program_id, false, 0,
        );
        let player = AccountInfo::new(
            &player_key, true, true, &mut player_lamports, &mut player_data, &program_id, false, 0,
        );
        let mut treasury = LamportVault::new(&vault, &player, None, 0);

        assert_eq!(
            treasury.withdraw(&Pubkey::new_unique(), 1),
            Err(ProgramError::InvalidArgument)
        );
        assert_eq!(
            treasury.withdraw(&player_key, 11),
            Err(ProgramError::from(LotteryError::InsufficientFunds))
        );
        assert_eq!(
            treasury.withdraw(&player_key, 5),
            Err(ProgramError::NotEnoughAccountKeys)
        );
        assert_eq!(player.lamports(), 10);

        let mut view = LamportVault::read_only(&vault, 400);
        assert_eq!(view.balance(), 600);
        assert_eq!(view.deposit(&player_key, 1), Err(ProgramError::InvalidArgument));
    }
}
