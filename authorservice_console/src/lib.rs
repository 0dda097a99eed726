pub mod authors_view;
pub mod cascade;
pub mod detach;

#[cfg(test)]
mod test_api;
