pub mod push_gateway;
