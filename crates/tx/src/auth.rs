//! Claim authorization messages.
//!
//! A channel owner authorizes the recipient off-ledger by signing a claim
//! message with the key pinned on the channel. The message layout is
//! bit-exact across implementations: the four bytes `CLM\0`, the 32-byte
//! channel id, and the authorized value as a big-endian 64-bit integer.
//! Issued-token claims append the 20-byte currency code and the 20-byte
//! issuer so a claim can never be replayed against another asset.

use rill_common::{Amount, Asset, Hash256};
use rill_crypto::{PublicKey, SecretKey, Signature};

const CLAIM_PREFIX: &[u8; 4] = b"CLM\0";

/// Serialize the authorization message for a claim of `amount` against
/// `channel`.
pub fn claim_authorization_message(channel: &Hash256, amount: &Amount) -> Vec<u8> {
    let mut msg = Vec::with_capacity(4 + 32 + 8 + 40);
    msg.extend_from_slice(CLAIM_PREFIX);
    msg.extend_from_slice(channel.as_bytes());
    msg.extend_from_slice(&amount.value.to_be_bytes());
    if let Asset::Issued { currency, issuer } = &amount.asset {
        msg.extend_from_slice(currency.as_bytes());
        msg.extend_from_slice(issuer.as_bytes());
    }
    msg
}

/// Verify a claim signature against the tagged key pinned on the channel.
///
/// Unknown key tags and malformed signatures verify false; verification is
/// strict, so non-canonical signature encodings are rejected.
pub fn verify_claim_signature(
    tagged_key: &[u8],
    channel: &Hash256,
    amount: &Amount,
    signature: &[u8],
) -> bool {
    let Ok(key) = PublicKey::from_tagged_bytes(tagged_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    let msg = claim_authorization_message(channel, amount);
    key.verify(&msg, &signature).is_ok()
}

/// Sign a claim of `amount` against `channel`.
pub fn sign_claim(secret: &SecretKey, channel: &Hash256, amount: &Amount) -> Signature {
    secret.sign(&claim_authorization_message(channel, amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_common::{AccountId, Currency};

    #[test]
    fn test_message_layout_native() {
        let channel = Hash256::hash(b"chan");
        let msg = claim_authorization_message(&channel, &Amount::drops(40_000));
        assert_eq!(msg.len(), 4 + 32 + 8);
        assert_eq!(&msg[..4], b"CLM\0");
        assert_eq!(&msg[4..36], channel.as_bytes());
        assert_eq!(&msg[36..], &40_000i64.to_be_bytes());
    }

    #[test]
    fn test_message_layout_issued() {
        let channel = Hash256::hash(b"chan");
        let issuer = AccountId([9; 20]);
        let amount = Amount::issued(40, Currency::from_code(b"USD"), issuer);
        let msg = claim_authorization_message(&channel, &amount);
        assert_eq!(msg.len(), 4 + 32 + 8 + 20 + 20);
        assert_eq!(&msg[44..64], Currency::from_code(b"USD").as_bytes());
        assert_eq!(&msg[64..], issuer.as_bytes());
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let secret = SecretKey::generate();
        let tagged = secret.public_key().to_tagged_bytes();
        let channel = Hash256::hash(b"chan");
        let amount = Amount::drops(40_000);

        let sig = sign_claim(&secret, &channel, &amount);
        assert!(verify_claim_signature(&tagged, &channel, &amount, sig.as_bytes()));

        // A different amount, channel, or key must not verify.
        assert!(!verify_claim_signature(
            &tagged,
            &channel,
            &Amount::drops(40_001),
            sig.as_bytes()
        ));
        assert!(!verify_claim_signature(
            &tagged,
            &Hash256::hash(b"other"),
            &amount,
            sig.as_bytes()
        ));
        let other = SecretKey::generate().public_key().to_tagged_bytes();
        assert!(!verify_claim_signature(&other, &channel, &amount, sig.as_bytes()));
    }

    #[test]
    fn test_bad_key_or_signature_shape() {
        let secret = SecretKey::generate();
        let channel = Hash256::hash(b"chan");
        let amount = Amount::drops(1);
        let sig = sign_claim(&secret, &channel, &amount);

        assert!(!verify_claim_signature(&[0u8; 33], &channel, &amount, sig.as_bytes()));
        let tagged = secret.public_key().to_tagged_bytes();
        assert!(!verify_claim_signature(&tagged, &channel, &amount, &[0u8; 10]));
    }
}
