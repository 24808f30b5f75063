//! # millkit CAM Tools
//!
//! Toolpath synthesis for three-axis milling of a height-field stock.
//!
//! ## Planners
//!
//! - **Rough Planner**: Two-plane strip roughing over a ball-dilated heightmap
//! - **Base Planner**: Flat-tool facing around the model silhouette plus one contour lap
//! - **Detail Planner**: UV raster finishing of a parametric surface
//!
//! ## Supporting Infrastructure
//!
//! - **Contour Graph**: Planar intersection graph, boundary walk and offsetting
//! - **Simplify**: Douglas-Peucker polyline reduction
//! - **Footprint**: Stock extents on the base plane

pub mod base;
pub mod contour_graph;
pub mod detail;
pub mod error;
pub mod footprint;
pub mod rough;
pub mod simplify;

// Re-export commonly used items
pub use base::{collect_silhouette, BaseParameters, BasePaths, BasePlanner};
pub use contour_graph::{
    extract_path, find_intersections, offset_contour, ContourEdge, ContourGraph,
    ContourGraphBuilder, ContourIntersection, ContourPath, ContourPlane, ContourSegment,
    ContourVertex, EdgeKey,
};
pub use detail::{DetailParameters, DetailPlanner};
pub use error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
pub use footprint::StockFootprint;
pub use rough::{ball_kernel, ClearanceMap, KernelEntry, RoughPlanner, RoughingParameters};
pub use simplify::{simplify, simplify_mask};
