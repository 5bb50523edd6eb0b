pub mod mind_map;
