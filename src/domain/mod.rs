pub mod normalize;
pub mod track;
