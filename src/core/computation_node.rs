// Copyright @yucwang 2021

pub trait ComputationNode {
    // One-line summary used in log output.
    fn to_string(&self) -> String;
}
