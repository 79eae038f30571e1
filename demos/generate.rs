use certsmith::cert::params::Identity;
use certsmith::error::CertError;
use certsmith::generator::CertGenerator;

fn main() -> Result<(), CertError> {
    let generator = CertGenerator::default();

    // Self-signed EC root that may only sign leaves.
    let (root, root_key) =
        generator.ec_root_ca(Identity::new("My Test CA", "Testing", "1", "US"), "P256")?;
    println!("CA Certificate PEM:\n{}", root.to_pem());
    println!("CA Key PEM:\n{}", root_key.to_pem()?);

    // RSA server certificate signed by the EC root.
    let (server, server_key) = generator.rsa_leaf_cert(
        Identity::new("myserver.local", "Testing", "2", "US"),
        2048,
        &root,
        &root_key,
    )?;
    server.verify_signed_by(&root)?;

    println!("Server Certificate PEM:\n{}", server.to_pem());
    println!("Server Key PEM:\n{}", server_key.to_pem()?);

    Ok(())
}
