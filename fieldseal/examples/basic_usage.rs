//! Basic usage example for `FieldSeal`.

use fieldseal::prelude::*;
use fieldseal_key_file::FileKeyProvider;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("FieldSeal Basic Usage Example");
    println!("=============================\n");

    let key_path = PathBuf::from("./example_keys/field.key");
    if !key_path.exists() {
        println!("Writing a new key to {}...", key_path.display());
        FileKeyProvider::init(&key_path)?;
    }

    let provider = FileKeyProvider::new(&key_path)?;
    let codec = FieldCodec::from_provider(&provider, CipherMode::default())?;
    println!("Codec ready ({:?})\n", codec.cipher_mode());

    // Two encryptions of the same value never share bytes
    let blob1 = codec.encrypt("alice@example.com")?;
    let blob2 = codec.encrypt("alice@example.com")?;
    println!("Blob 1 ({} bytes): {}", blob1.len(), hex::encode(blob1.as_bytes()));
    println!("Blob 2 ({} bytes): {}", blob2.len(), hex::encode(blob2.as_bytes()));
    println!("Identical: {}\n", blob1 == blob2);

    println!("Decrypted: {}\n", codec.decrypt(blob1.as_bytes())?);

    let directory = Directory::new(codec, MemoryStore::new(), "users")?;
    let alice = directory.register("alice@example.com", &[("phone_number", "+1 555 0100")])?;
    let bob = directory.register("bob@example.com", &[("phone_number", "+1 555 0199")])?;
    println!("Registered alice as {alice}, bob as {bob}");

    let found = directory.login("  BOB@example.com ")?;
    println!("Login as '  BOB@example.com ' resolved to {found}");

    let indexed = directory.lookup_indexed("alice@example.com")?;
    println!("Blind index lookup for alice resolved to {indexed}");

    let record = directory.read(found)?;
    println!("Record {found}: {} / {}", record.identity, record.fields["phone_number"]);

    match directory.login("mallory@example.com") {
        Err(Error::NotFound) => println!("mallory@example.com is not registered"),
        other => println!("unexpected: {other:?}"),
    }

    Ok(())
}
