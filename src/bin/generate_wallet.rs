//! Key generator for the external signing backend
//!
//! Run with: cargo run --bin generate-wallet

use alloy_signer_local::PrivateKeySigner;
use console::style;

fn main() {
    let signer = PrivateKeySigner::random();
    let private_key = format!("0x{}", hex::encode(signer.credential().to_bytes()));

    println!();
    println!("{}", style("🌾 New staking wallet").cyan().bold());
    println!();
    println!("   Address:     {:?}", signer.address());
    println!("   Private Key: {}", private_key);
    println!();
    println!("{}", style("Add to .env:").bold());
    println!();
    println!("   SIGNING_BACKEND=external");
    println!("   WALLET_PRIVATE_KEY={}", private_key);
    println!();
    println!("This key signs stake permits itself, so `stake` skips the approval");
    println!("transaction. Custodial relay wallets cannot sign permits and always");
    println!("approve first; they need no key here, only CUSTODIAL_WALLET_ID.");
    println!();
    println!("Before staking, send the address the native coin for gas and the");
    println!("LP tokens of the pair you want to stake.");
    println!();
    println!("{}", style("⚠️  Anyone holding this key controls the staked LP tokens and rewards.").yellow());
    println!();
}
