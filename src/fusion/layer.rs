//! Block-hashed voxel layer
//!
//! Space is split into cubic blocks of `voxels_per_side^3` voxels. Only
//! blocks that have been allocated are stored, keyed by their integer block
//! index. Voxels are addressed either inside a block by a linear index
//! (`x + vps * (y + vps * z)`) or globally by an integer voxel index whose
//! voxel center is `(index + 0.5) * voxel_size`.

use std::collections::HashMap;

use glam::{IVec3, Vec3};

/// Integer index of a block in the layer
pub type BlockIndex = IVec3;
/// Integer index of a voxel in the whole layer
pub type GlobalVoxelIndex = IVec3;

/// A cube of voxels
#[derive(Debug, Clone)]
pub struct Block<V> {
    index: BlockIndex,
    voxels_per_side: usize,
    voxel_size: f32,
    origin: Vec3,
    voxels: Vec<V>,
}

impl<V: Default + Clone> Block<V> {
    pub fn new(index: BlockIndex, voxels_per_side: usize, voxel_size: f32) -> Self {
        let block_size = voxels_per_side as f32 * voxel_size;
        Self {
            index,
            voxels_per_side,
            voxel_size,
            origin: index.as_vec3() * block_size,
            voxels: vec![V::default(); voxels_per_side.pow(3)],
        }
    }
}

impl<V> Block<V> {
    pub fn index(&self) -> BlockIndex {
        self.index
    }

    /// Minimum corner of the block
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn block_size(&self) -> f32 {
        self.voxels_per_side as f32 * self.voxel_size
    }

    pub fn center(&self) -> Vec3 {
        self.origin + Vec3::splat(0.5 * self.block_size())
    }

    pub fn voxels_per_side(&self) -> usize {
        self.voxels_per_side
    }

    pub fn num_voxels(&self) -> usize {
        self.voxels.len()
    }

    pub fn voxels(&self) -> &[V] {
        &self.voxels
    }

    pub fn is_valid_linear_index(&self, linear_index: usize) -> bool {
        linear_index < self.voxels.len()
    }

    pub fn voxel_by_linear_index(&self, linear_index: usize) -> Option<&V> {
        self.voxels.get(linear_index)
    }

    pub fn voxel_by_linear_index_mut(&mut self, linear_index: usize) -> Option<&mut V> {
        self.voxels.get_mut(linear_index)
    }

    /// Local (in-block) voxel index of a linear index
    pub fn voxel_index_from_linear_index(&self, linear_index: usize) -> IVec3 {
        let vps = self.voxels_per_side;
        IVec3::new(
            (linear_index % vps) as i32,
            ((linear_index / vps) % vps) as i32,
            (linear_index / (vps * vps)) as i32,
        )
    }

    /// Linear index of a local voxel index, `None` outside the block
    pub fn linear_index_from_voxel_index(&self, voxel_index: IVec3) -> Option<usize> {
        let vps = self.voxels_per_side as i32;
        if voxel_index.cmplt(IVec3::ZERO).any() || voxel_index.cmpge(IVec3::splat(vps)).any() {
            return None;
        }
        Some((voxel_index.x + vps * (voxel_index.y + vps * voxel_index.z)) as usize)
    }

    /// Center of the voxel at `linear_index`
    pub fn coordinates_from_linear_index(&self, linear_index: usize) -> Vec3 {
        let local = self.voxel_index_from_linear_index(linear_index);
        self.origin + (local.as_vec3() + Vec3::splat(0.5)) * self.voxel_size
    }

    /// Global voxel index of the voxel at `linear_index`
    pub fn global_index_from_linear_index(&self, linear_index: usize) -> GlobalVoxelIndex {
        self.index * self.voxels_per_side as i32 + self.voxel_index_from_linear_index(linear_index)
    }
}

/// Sparse collection of blocks sharing a voxel size
#[derive(Debug, Clone)]
pub struct Layer<V> {
    voxel_size: f32,
    voxels_per_side: usize,
    blocks: HashMap<BlockIndex, Block<V>>,
}

impl<V> Layer<V> {
    pub fn new(voxel_size: f32, voxels_per_side: usize) -> Self {
        Self {
            voxel_size,
            voxels_per_side,
            blocks: HashMap::new(),
        }
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub fn voxels_per_side(&self) -> usize {
        self.voxels_per_side
    }

    pub fn block_size(&self) -> f32 {
        self.voxel_size * self.voxels_per_side as f32
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Allocated block indices in lexicographic (x, y, z) order
    pub fn allocated_block_indices(&self) -> Vec<BlockIndex> {
        let mut indices: Vec<BlockIndex> = self.blocks.keys().copied().collect();
        indices.sort_by_key(|index| (index.x, index.y, index.z));
        indices
    }

    pub fn block(&self, index: &BlockIndex) -> Option<&Block<V>> {
        self.blocks.get(index)
    }

    pub fn block_mut(&mut self, index: &BlockIndex) -> Option<&mut Block<V>> {
        self.blocks.get_mut(index)
    }

    /// Unordered iteration over the allocated blocks
    pub fn blocks(&self) -> impl Iterator<Item = &Block<V>> {
        self.blocks.values()
    }

    pub fn insert_block(&mut self, block: Block<V>) {
        self.blocks.insert(block.index(), block);
    }

    pub fn remove_block(&mut self, index: &BlockIndex) -> Option<Block<V>> {
        self.blocks.remove(index)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Index of the block containing `point`
    pub fn block_index_from_point(&self, point: Vec3) -> BlockIndex {
        (point / self.block_size()).floor().as_ivec3()
    }

    /// Index of the voxel containing `point`
    pub fn global_index_from_point(&self, point: Vec3) -> GlobalVoxelIndex {
        (point / self.voxel_size).floor().as_ivec3()
    }

    pub fn voxel_center(&self, index: GlobalVoxelIndex) -> Vec3 {
        (index.as_vec3() + Vec3::splat(0.5)) * self.voxel_size
    }

    /// Split a global voxel index into its block index and in-block linear index
    pub fn split_global_index(&self, index: GlobalVoxelIndex) -> (BlockIndex, usize) {
        let vps = self.voxels_per_side as i32;
        let block = IVec3::new(
            index.x.div_euclid(vps),
            index.y.div_euclid(vps),
            index.z.div_euclid(vps),
        );
        let local = index - block * vps;
        let linear = (local.x + vps * (local.y + vps * local.z)) as usize;
        (block, linear)
    }

    pub fn voxel(&self, index: GlobalVoxelIndex) -> Option<&V> {
        let (block_index, linear) = self.split_global_index(index);
        self.blocks.get(&block_index)?.voxel_by_linear_index(linear)
    }

    pub fn voxel_mut(&mut self, index: GlobalVoxelIndex) -> Option<&mut V> {
        let (block_index, linear) = self.split_global_index(index);
        self.blocks.get_mut(&block_index)?.voxel_by_linear_index_mut(linear)
    }
}

impl<V: Default + Clone> Layer<V> {
    /// Get the block at `index`, allocating it if needed
    pub fn allocate_block(&mut self, index: BlockIndex) -> &mut Block<V> {
        let (vps, voxel_size) = (self.voxels_per_side, self.voxel_size);
        self.blocks
            .entry(index)
            .or_insert_with(|| Block::new(index, vps, voxel_size))
    }

    /// Get the voxel at `index`, allocating its block if needed
    pub fn allocate_voxel(&mut self, index: GlobalVoxelIndex) -> &mut V {
        let (block_index, linear) = self.split_global_index(index);
        let block = self.allocate_block(block_index);
        &mut block.voxels[linear]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_index_roundtrip() {
        let block: Block<f32> = Block::new(IVec3::new(1, -1, 0), 8, 0.1);
        for linear in [0, 1, 7, 8, 63, 64, 511] {
            let local = block.voxel_index_from_linear_index(linear);
            assert_eq!(block.linear_index_from_voxel_index(local), Some(linear));
        }
        assert!(block.linear_index_from_voxel_index(IVec3::new(8, 0, 0)).is_none());
        assert!(block.is_valid_linear_index(511));
        assert!(!block.is_valid_linear_index(512));
    }

    #[test]
    fn test_block_coordinates() {
        let block: Block<f32> = Block::new(IVec3::new(1, -1, 0), 4, 0.5);
        assert!(block.origin().abs_diff_eq(Vec3::new(2.0, -2.0, 0.0), 1e-6));
        assert!(block
            .coordinates_from_linear_index(0)
            .abs_diff_eq(Vec3::new(2.25, -1.75, 0.25), 1e-6));
        assert!(block.center().abs_diff_eq(Vec3::new(3.0, -1.0, 1.0), 1e-6));
    }

    #[test]
    fn test_split_negative_global_index() {
        let layer: Layer<f32> = Layer::new(0.1, 8);
        let (block, linear) = layer.split_global_index(IVec3::new(-1, 0, 8));
        assert_eq!(block, IVec3::new(-1, 0, 1));
        assert_eq!(linear, 7);
    }

    #[test]
    fn test_global_index_matches_block_coordinates() {
        let mut layer: Layer<f32> = Layer::new(0.2, 4);
        let index = IVec3::new(-3, 5, 2);
        *layer.allocate_voxel(index) = 1.5;

        let (block_index, linear) = layer.split_global_index(index);
        let block = layer.block(&block_index).unwrap();
        assert_eq!(block.global_index_from_linear_index(linear), index);
        assert!(block
            .coordinates_from_linear_index(linear)
            .abs_diff_eq(layer.voxel_center(index), 1e-5));
        assert_eq!(layer.voxel(index), Some(&1.5));
        assert_eq!(layer.global_index_from_point(layer.voxel_center(index)), index);
    }

    #[test]
    fn test_allocated_indices_are_sorted() {
        let mut layer: Layer<f32> = Layer::new(0.1, 2);
        layer.allocate_block(IVec3::new(1, 0, 0));
        layer.allocate_block(IVec3::new(-1, 2, 0));
        layer.allocate_block(IVec3::new(0, 0, 0));

        assert_eq!(
            layer.allocated_block_indices(),
            vec![IVec3::new(-1, 2, 0), IVec3::new(0, 0, 0), IVec3::new(1, 0, 0)]
        );
    }
}
