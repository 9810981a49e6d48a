//! CIDR operations example
//!
//! Run with: cargo run -p ipcon-cidr --example cidr_operations

use ipcon_cidr::{summarize, Cidr};
use ipcon_core::{format_address, parse_address};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("IPCON - CIDR Operations Example\n");

    let cidr = Cidr::parse("192.168.1.0/24")?;

    println!("CIDR: {}", cidr);
    println!("─────────────────────────────");
    println!("Network:       {}", format_address(cidr.network()));
    println!("Netmask:       {}", format_address(cidr.mask()));
    println!("Binary mask:   {}", cidr.binary_netmask());
    println!("Broadcast:     {}", format_address(cidr.broadcast()));
    println!("First usable:  {}", format_address(cidr.first_usable()));
    println!("Last usable:   {}", format_address(cidr.last_usable()));
    println!("Usable hosts:  {}", cidr.usable_hosts());
    println!("Class:         {}", cidr.address_class());

    println!("\nChecking IP containment:");
    println!("192.168.1.100 in range? {}", cidr.contains(parse_address("192.168.1.100")?));
    println!("192.168.2.1 in range?   {}", cidr.contains(parse_address("192.168.2.1")?));

    let start = parse_address("10.0.0.5")?;
    let end = parse_address("10.0.1.17")?;
    println!("\nSummarizing 10.0.0.5 - 10.0.1.17:");
    for block in summarize(start, end) {
        println!("  {}", block);
    }

    Ok(())
}
