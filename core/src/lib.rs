//! Board discovery: reading the neighbor table, classifying hardware addresses by vendor
//! prefix, and keeping the inventory of boards found on the network.

pub mod arp;
pub mod discovery;
pub mod ieee;
pub mod inventory;
pub mod remote;
pub mod sweep;
pub mod system;
pub mod vendors;
