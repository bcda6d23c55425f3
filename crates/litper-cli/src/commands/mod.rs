pub mod ask;
pub mod city;
pub mod config;
pub mod import;
pub mod novedades;
pub mod pedidos;
pub mod serve;
pub mod shipments;
pub mod status;
