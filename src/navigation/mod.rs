//! Flow fields are a means of steering a crowd of agents towards a shared
//! target with a single calculation.
//!
//! [Fixing Pathfinding Once and For All](https://web.archive.org/web/20150905073624/http://www.ai-blog.net/archives/000152.html)
//!
//! [SupCom2- Elijah Emerson](https://www.gameaipro.com/GameAIPro/GameAIPro_Chapter23_Crowd_Pathfinding_and_Steering_Using_Flow_Field_Tiles.pdf)
//!
//! The map is a grid of chunks, each made up of tiles, held once per
//! navigation layer in a [grid::nav_grid::NavGrid]. Agents moving between
//! chunks follow a route of portals planned elsewhere, within a chunk they
//! sample a [fields::flow_field::FlowField] built towards the next portal or
//! the final target:
//!
//! 1. The target is resolved into seed tiles ([frontier])
//! 2. A wavefront integrates the cost of reaching a seed from every tile
//! 3. Each tile points at its cheapest neighbour
//!
//! When the target can't be reached from where an agent stands the
//! [fallback] searches lead it as close as it can get instead.
//!
//! Builders only read the grid and the [query::QueryContext] and write into
//! their own output plus a caller owned [workspace::Workspace], so any number
//! of fields can be built in parallel against one snapshot.
//!

pub mod error;
pub mod fallback;
pub mod fields;
pub mod frontier;
pub mod grid;
pub mod query;
pub mod utilities;
pub mod workspace;
