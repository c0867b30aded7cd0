//! Fixed-capacity particle storage.

use super::particle::{Particle, ParticleData};

/// Default number of particle slots.
pub const DEFAULT_POOL_SIZE: usize = 300;

/// A fixed-capacity pool of reusable particles.
///
/// Slots are handed out first-fit in slot order and the pool never grows:
/// once every slot is taken, acquisitions fail until a particle retires.
#[derive(Debug, Clone)]
pub struct Pool {
    particles: Vec<Particle>,
    active: usize,
    /// Every slot below this index is occupied.
    first_free: usize,
}

impl Pool {
    /// Allocates `capacity` inactive particles.
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::default(); capacity],
            active: 0,
            first_free: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Number of occupied slots.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Returns whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Claims the first free slot.
    ///
    /// The particle comes back marked active, with its age reset and its
    /// effect data cleared. Every other field still holds whatever the
    /// previous occupant left behind.
    pub fn acquire(&mut self) -> Option<&mut Particle> {
        if self.active == self.particles.len() {
            return None;
        }
        let offset = self.particles[self.first_free..]
            .iter()
            .position(|particle| !particle.active)?;
        let index = self.first_free + offset;
        self.first_free = index + 1;
        self.active += 1;

        let particle = &mut self.particles[index];
        particle.active = true;
        particle.age = 0;
        particle.data = ParticleData::None;
        Some(particle)
    }

    /// Returns the slot at `index`.
    pub fn slot(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Returns the slot at `index` mutably.
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    /// Frees the slot at `index`. Freeing an inactive slot does nothing.
    pub(crate) fn release(&mut self, index: usize) {
        if let Some(particle) = self.particles.get_mut(index) {
            if particle.active {
                particle.active = false;
                self.active -= 1;
                self.first_free = self.first_free.min(index);
            }
        }
    }

    /// Frees every slot.
    pub fn clear(&mut self) {
        for particle in &mut self.particles {
            particle.active = false;
        }
        self.active = 0;
        self.first_free = 0;
    }

    /// Iterates over the active particles in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|particle| particle.active)
    }
}

/// The capability handed to an effect during a spawn.
///
/// Each call to [`Acquirer::acquire`] claims one slot. After the first
/// failure the acquirer stays exhausted without scanning the pool again.
#[derive(Debug)]
pub struct Acquirer<'a> {
    pool: &'a mut Pool,
    acquired: usize,
    exhausted: bool,
}

impl<'a> Acquirer<'a> {
    /// Wraps a pool.
    pub fn new(pool: &'a mut Pool) -> Self {
        Self {
            pool,
            acquired: 0,
            exhausted: false,
        }
    }

    /// Claims the next free particle, or `None` once the pool is full.
    pub fn acquire(&mut self) -> Option<&mut Particle> {
        if self.exhausted {
            return None;
        }
        match self.pool.acquire() {
            Some(particle) => {
                self.acquired += 1;
                Some(particle)
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Number of particles claimed through this acquirer.
    pub fn acquired(&self) -> usize {
        self.acquired
    }

    /// Returns whether an acquisition has failed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_until_full() {
        let mut pool = Pool::new(3);
        assert_eq!(pool.capacity(), 3);
        assert!(pool.is_empty());

        for _ in 0..3 {
            let particle = pool.acquire().unwrap();
            assert!(particle.is_active());
        }
        assert_eq!(pool.active_count(), 3);
        assert!(pool.acquire().is_none());
        assert_eq!(pool.active_count(), 3);
    }

    #[test]
    fn test_acquire_resets_recycled_slot() {
        let mut pool = Pool::new(1);
        {
            let particle = pool.acquire().unwrap();
            particle.age = 12;
            particle.data = ParticleData::Frost { spokes: 6 };
        }
        pool.release(0);
        assert!(pool.is_empty());

        let particle = pool.acquire().unwrap();
        assert_eq!(particle.age, 0);
        assert_eq!(particle.data, ParticleData::None);
    }

    #[test]
    fn test_release_reuses_lowest_slot() {
        let mut pool = Pool::new(4);
        for _ in 0..4 {
            pool.acquire().unwrap();
        }
        pool.release(2);
        pool.release(1);
        pool.release(1);
        assert_eq!(pool.active_count(), 2);

        pool.acquire().unwrap().x = 11.0;
        pool.acquire().unwrap().x = 22.0;
        assert_eq!(pool.slot(1).unwrap().x, 11.0);
        assert_eq!(pool.slot(2).unwrap().x, 22.0);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_acquirer_stops_after_exhaustion() {
        let mut pool = Pool::new(2);
        let mut acquirer = Acquirer::new(&mut pool);
        assert!(acquirer.acquire().is_some());
        assert!(acquirer.acquire().is_some());
        assert!(acquirer.acquire().is_none());
        assert!(acquirer.is_exhausted());
        assert_eq!(acquirer.acquired(), 2);
    }

    #[test]
    fn test_clear() {
        let mut pool = Pool::new(5);
        for _ in 0..5 {
            pool.acquire().unwrap();
        }
        pool.clear();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.iter_active().count(), 0);
        assert!(pool.acquire().is_some());
    }
}
