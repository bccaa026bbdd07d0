//! Transaction builder for swaps

use duopool_core::instruction;
use duopool_core::SwapAccounts;
use solana_sdk::{
    hash::Hash, instruction::Instruction, pubkey::Pubkey, signature::Keypair, signer::Signer,
    transaction::Transaction,
};

use crate::request::SwapRequest;

/// Build the swap instruction for `request`, signed by `owner`
pub fn build_swap_instruction(
    program_id: &Pubkey,
    base_asset: &Pubkey,
    owner: &Pubkey,
    request: &SwapRequest,
) -> Instruction {
    let accounts = SwapAccounts {
        owner: *owner,
        source: request.source,
        destination: request.destination,
    };
    instruction::swap(
        program_id,
        base_asset,
        &accounts,
        request.input,
        request.amount_in,
        request.min_amount_out,
    )
}

/// Build the signed swap transaction, payer and owner both `payer`
pub fn build_swap_transaction(
    program_id: &Pubkey,
    base_asset: &Pubkey,
    payer: &Keypair,
    request: &SwapRequest,
    recent_blockhash: Hash,
) -> Transaction {
    let instruction = build_swap_instruction(program_id, base_asset, &payer.pubkey(), request);

    Transaction::new_signed_with_payer(
        &[instruction],
        Some(&payer.pubkey()),
        &[payer],
        recent_blockhash,
    )
}
